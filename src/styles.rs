use serde::{Deserialize, Serialize};

/// A named preset bundling a prompt string and display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub preview_color: String,
}

impl StyleTemplate {
    /// Display name without the parenthesised alias, as stored in history.
    pub fn short_name(&self) -> &str {
        self.name.split('(').next().unwrap_or(&self.name).trim()
    }
}

struct Preset {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    prompt: &'static str,
    tags: [&'static str; 3],
    color: &'static str,
}

const PRESETS: [Preset; 10] = [
    Preset {
        id: "hotel-luxury",
        name: "Five-Star Hotel White (Luxury Hotel)",
        description: "Top-tier hotel bathroom. Marble walls, frameless glass, bright and airy; stresses purity and premium feel.",
        prompt: "High-end 5-star hotel bathroom interior. Background: White Carrara marble walls, frameless glass shower enclosure, large illuminated vanity mirror. Lighting: Bright, airy, cool-toned professional interior lighting, sparkling chrome reflections. Atmosphere: Hygienic, expensive, spacious, pristine cleanliness. The product is the centerpiece of a luxury vanity area.",
        tags: ["marble", "hotel", "bright"],
        color: "#F5F5F5",
    },
    Preset {
        id: "japanese-zen",
        name: "Wabi-Sabi Bath Aesthetic (Wabi-Sabi)",
        description: "Quiet space of micro-cement and limestone. Countertops kept clean with no plants; soft, coordinated light.",
        prompt: "High-end Wabi-Sabi bathroom aesthetic, luxury spa environment. Background: Textured micro-cement walls, matte limestone floor, stone textures. Lighting: Perfectly coordinated soft diffused light, calm and moody atmosphere, gentle shadows, subtle steam vibe. Composition: Ultra-minimalist, keeping the product surface strictly CLEAN and EMPTY (NO plants, NO vases, NO clutter on top of the cabinet/product). Focus on material textures, earthy beige and grey tones, architectural silence.",
        tags: ["micro-cement", "calm", "uncluttered"],
        color: "#A8A29E",
    },
    Preset {
        id: "nordic-wood",
        name: "Nordic Warm Wood (Nordic)",
        description: "Cosy bathroom of light wood grain and white tiles in morning sun. Suits family and storage products.",
        prompt: "Scandinavian nordic bathroom design. Background: Light oak wood vanity cabinets, matte white subway tiles or hexagonal floor tiles. Lighting: Natural morning sunlight streaming through a frosted window, soft warm glow. Atmosphere: Cozy, functional, family-friendly, hygienic, organic simplicity.",
        tags: ["light wood", "white tile", "cosy"],
        color: "#E0E0E0",
    },
    Preset {
        id: "modern-industrial",
        name: "Modern Industrial Grey (Industrial)",
        description: "Fair-faced concrete and black hardware. Shows off characterful pieces with clean lines.",
        prompt: "Modern industrial loft bathroom. Background: Raw concrete (beton brut) walls, dark grey slate flooring. Accents: Matte black fixtures, steel pipes, frameless mirror. Lighting: Dramatic, slightly cool artificial lighting, high contrast shadows. Atmosphere: Masculine, sleek, architectural, edgy.",
        tags: ["concrete", "black hardware", "bold"],
        color: "#607D8B",
    },
    Preset {
        id: "taiwan-retro",
        name: "Taiwanese Retro Bathroom (Retro TW)",
        description: "Grandma's bathroom. Green and white mosaic tiles with begonia-pattern glass; nostalgic yet stylish.",
        prompt: "Vintage Taiwanese bathroom aesthetic (1980s style). Background: Classic small mosaic tiles (green and white color scheme), patterned glass window (begonia flower pattern), terrazzo flooring. Lighting: Warm tungsten nostalgic glow. Atmosphere: Retro-chic, cultural, nostalgic, Wong Kar-wai cinematic vibe.",
        tags: ["mosaic", "retro", "nostalgic"],
        color: "#4DB6AC",
    },
    Preset {
        id: "k-cream",
        name: "Korean Cream Style (Cream Style)",
        description: "Instagram-ready bathroom. Beige terrazzo and curved lines, soft and dreamy.",
        prompt: "Trendy Korean aesthetic bathroom. Background: Cream and beige terrazzo tiles, curved architectural details, arched mirrors. Lighting: Very soft, diffuse, low contrast \"Instagram filter\" look, pastel tones. Atmosphere: Dreamy, soft, feminine, minimalist lifestyle.",
        tags: ["cream", "terrazzo", "soft"],
        color: "#FFF3E0",
    },
    Preset {
        id: "dark-moody",
        name: "Dark Mansion Powder Room (Dark Luxury)",
        description: "Guest bathroom of a mansion. Black stone, indirect lighting and gold hardware with dramatic shadows.",
        prompt: "Ultra-luxury dark powder room. Background: Black Nero Marquina marble or dark slate walls, brass or gold fixtures context. Lighting: Moody, dramatic chiaroscuro, hidden LED strip lighting, spotlight on the product. Atmosphere: Mysterious, expensive, exclusive, high-contrast.",
        tags: ["dark", "gold", "luxury"],
        color: "#212121",
    },
    Preset {
        id: "nature-spa",
        name: "Forest Spa (Nature Spa)",
        description: "Semi-outdoor bathroom with a big garden view. Connects with nature for a resort spa feel.",
        prompt: "Nature-inspired spa bathroom. Background: Large window overlooking a tropical garden or bamboo forest, natural stone elements. Lighting: Dappled sunlight through leaves, fresh and organic. Atmosphere: Relaxing, retreat, wellness, breathing, connected to nature.",
        tags: ["greenery", "window view", "resort"],
        color: "#81C784",
    },
    Preset {
        id: "studio-clean",
        name: "Pure White Studio (Studio)",
        description: "Seamless white backdrop. Professional studio shoot that highlights glaze and product detail.",
        prompt: "Professional sanitary ware studio photography. Background: Infinite pure white cyclorama. Lighting: Calculated studio strobe lighting to highlight ceramic glaze and chrome reflections perfectly. Atmosphere: Clinical, sharp, product-focused, catalog style.",
        tags: ["pure white", "studio", "catalog"],
        color: "#FFFFFF",
    },
    Preset {
        id: "muji-style",
        name: "Japanese Minimal Living (MUJI Style)",
        description: "White walls and oak storage. Practical, just-enough living that stays tidy and bright.",
        prompt: "Japanese MUJI style bathroom interior. Background: Pure white smooth walls, light oak wood shelving units, rattan storage baskets, beige cotton towels. Lighting: Bright, even natural daylight, soft and functional. Atmosphere: Organized, practical, \"just enough\" philosophy, minimalist daily life, clean and warm.",
        tags: ["minimal", "pure white", "practical"],
        color: "#D7CCC8",
    },
];

/// The built-in styles, in display order.
pub fn preset_styles() -> Vec<StyleTemplate> {
    PRESETS
        .iter()
        .map(|p| StyleTemplate {
            id: p.id.into(),
            name: p.name.into(),
            description: p.description.into(),
            prompt: p.prompt.into(),
            tags: p.tags.iter().map(|t| t.to_string()).collect(),
            preview_color: p.color.into(),
        })
        .collect()
}

/// Presets plus any model-suggested styles, with one style selected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleCatalog {
    styles: Vec<StyleTemplate>,
    selected: Option<String>,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleCatalog {
    /// Presets only, first preset selected.
    pub fn new() -> Self {
        let styles = preset_styles();
        let selected = styles.first().map(|s| s.id.clone());
        Self { styles, selected }
    }

    pub fn styles(&self) -> &[StyleTemplate] {
        &self.styles
    }

    pub fn get(&self, id: &str) -> Option<&StyleTemplate> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn selected(&self) -> Option<&StyleTemplate> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    /// Replaces earlier suggestions: the catalog becomes `suggested ++ presets`
    /// and the first suggestion is selected.
    pub fn apply_suggestions(&mut self, suggested: Vec<StyleTemplate>) {
        if let Some(first) = suggested.first() {
            self.selected = Some(first.id.clone());
        }
        let mut styles = suggested;
        styles.extend(preset_styles());
        self.styles = styles;
        if self.selected().is_none() {
            self.selected = self.styles.first().map(|s| s.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(id: &str) -> StyleTemplate {
        StyleTemplate {
            id: id.into(),
            name: format!("Suggested {id} (AI)"),
            description: "from the model".into(),
            prompt: "soft light".into(),
            tags: vec![],
            preview_color: "#000000".into(),
        }
    }

    #[test]
    fn presets_are_unique_and_first_is_selected() {
        let cat = StyleCatalog::new();
        assert_eq!(cat.styles().len(), 10);
        let mut ids: Vec<_> = cat.styles().iter().map(|s| s.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        assert_eq!(cat.selected().map(|s| s.id.as_str()), Some("hotel-luxury"));
    }

    #[test]
    fn short_name_strips_alias() {
        let cat = StyleCatalog::new();
        let nordic = cat.get("nordic-wood").unwrap();
        assert_eq!(nordic.short_name(), "Nordic Warm Wood");
        assert_eq!(suggestion("x").short_name(), "Suggested x");
    }

    #[test]
    fn suggestions_go_first_and_are_selected() {
        let mut cat = StyleCatalog::new();
        cat.apply_suggestions(vec![suggestion("ai-1"), suggestion("ai-2")]);
        assert_eq!(cat.styles().len(), 12);
        assert_eq!(cat.styles()[0].id, "ai-1");
        assert_eq!(cat.styles()[2].id, "hotel-luxury");
        assert_eq!(cat.selected().unwrap().id, "ai-1");

        // a second round replaces the first batch instead of stacking
        cat.apply_suggestions(vec![suggestion("ai-3")]);
        assert_eq!(cat.styles().len(), 11);
        assert!(cat.get("ai-1").is_none());
    }

    #[test]
    fn empty_suggestions_keep_selection() {
        let mut cat = StyleCatalog::new();
        assert!(cat.select("k-cream"));
        cat.apply_suggestions(vec![]);
        assert_eq!(cat.selected().unwrap().id, "k-cream");
        assert!(!cat.select("missing"));
    }
}
