// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Style-modifier table.

/// A selectable style: its key, a display label and the modifier appended to
/// the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub modifier: &'static str,
}

pub const STYLES: &[StyleEntry] = &[
    StyleEntry {
        key: "realistic",
        label: "Realistic",
        description: "photographic realism",
        modifier: "高画质, 写实风格, 专业摄影",
    },
    StyleEntry {
        key: "anime",
        label: "Anime",
        description: "Japanese anime illustration",
        modifier: "动漫风格, 日式插画, 精美绘画",
    },
    StyleEntry {
        key: "artistic",
        label: "Artistic",
        description: "oil and watercolor painting",
        modifier: "艺术风格, 油画质感, 创意插画",
    },
    StyleEntry {
        key: "cyberpunk",
        label: "Cyberpunk",
        description: "futuristic neon",
        modifier: "赛博朋克风格, 霓虹灯光, 未来科技",
    },
    StyleEntry {
        key: "vintage",
        label: "Vintage",
        description: "nostalgic film grain",
        modifier: "复古风格, 胶片质感, 怀旧色调",
    },
    StyleEntry {
        key: "minimalist",
        label: "Minimalist",
        description: "clean modern design",
        modifier: "极简主义, 简约设计, 干净构图",
    },
    StyleEntry {
        key: "impressionist",
        label: "Impressionist",
        description: "soft dreamy light",
        modifier: "印象派画风, 朦胧质感, 光影效果",
    },
    StyleEntry {
        key: "pop_art",
        label: "Pop art",
        description: "bright colors and patterns",
        modifier: "波普艺术, 明亮色彩, 图案设计",
    },
    StyleEntry {
        key: "sketch",
        label: "Sketch",
        description: "hand-drawn pencil",
        modifier: "素描风格, 铅笔画, 手绘线条",
    },
    StyleEntry {
        key: "watercolor",
        label: "Watercolor",
        description: "translucent watercolor",
        modifier: "水彩画风, 透明质感, 柔和色彩",
    },
    StyleEntry {
        key: "gothic",
        label: "Gothic",
        description: "dark mysterious aesthetics",
        modifier: "哥特风格, 暗黑美学, 神秘氛围",
    },
    StyleEntry {
        key: "fantasy",
        label: "Fantasy",
        description: "magical worlds",
        modifier: "奇幻风格, 魔法世界, 幻想生物",
    },
];

/// Looks up a style by key.
pub fn find_style(key: &str) -> Option<&'static StyleEntry> {
    STYLES.iter().find(|s| s.key == key)
}

/// Modifier for `key`; unknown keys get an empty modifier.
pub fn style_modifier(key: &str) -> &'static str {
    find_style(key).map(|s| s.modifier).unwrap_or("")
}

/// The prompt with the style's modifier appended.
pub fn augment_prompt(prompt: &str, style: &str) -> String {
    let modifier = style_modifier(style);
    if modifier.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}, {modifier}")
    }
}
