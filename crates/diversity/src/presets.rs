//! Built-in representative catalog for images (style, palette, context,
//! lighting, framework) and video scripts (angle, technique, concept).
//! Production deployments load the full catalog from JSON instead.

use creative_core::error::DiversityResult;
use creative_core::types::{CreativeDimensionValue, Dimension};

use crate::catalog::PresetCatalog;

struct Row {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    sectors: &'static [&'static str],
    categories: &'static [&'static str],
    moods: &'static [&'static str],
}

const STYLES: &[Row] = &[
    Row {
        id: "style-studio-minimal",
        name: "Studio Clean & Minimal",
        description: "Pure white cyc wall, single key light, rim separation",
        sectors: &["tech", "cosmetic", "fashion"],
        categories: &["electronics", "skincare", "accessories"],
        moods: &["premium", "clean", "minimal"],
    },
    Row {
        id: "style-food-editorial",
        name: "Food Editorial Overhead",
        description: "Overhead flat lay with styled props and natural texture",
        sectors: &["food", "beverage"],
        categories: &["snack", "meal", "beverage", "coffee"],
        moods: &["gourmet", "appetizing", "warm"],
    },
    Row {
        id: "style-lifestyle-candid",
        name: "Lifestyle Candid",
        description: "Real people in real moments, documentary framing",
        sectors: &["all"],
        categories: &[],
        moods: &["authentic", "everyday", "friendly"],
    },
    Row {
        id: "style-cinematic-dark",
        name: "Cinematic Low Key",
        description: "Dramatic shadows, anamorphic feel, moody grade",
        sectors: &["beverage", "fashion", "tech"],
        categories: &["spirits", "watch", "audio"],
        moods: &["dramatic", "luxury", "night"],
    },
    Row {
        id: "style-splash-action",
        name: "High-Speed Splash",
        description: "Frozen liquid motion, strobe lit droplets",
        sectors: &["beverage"],
        categories: &["soda", "juice", "water", "beverage"],
        moods: &["energetic", "refreshing", "summer"],
    },
    Row {
        id: "style-beauty-macro",
        name: "Beauty Macro Texture",
        description: "Extreme close-up of textures, creams and serums",
        sectors: &["cosmetic", "wellness"],
        categories: &["skincare", "makeup", "serum"],
        moods: &["sensorial", "premium", "selfcare"],
    },
    Row {
        id: "style-nature-organic",
        name: "Organic Nature Setting",
        description: "Product placed in moss, stone and daylight",
        sectors: &["wellness", "food", "cosmetic"],
        categories: &["organic", "tea", "skincare"],
        moods: &["natural", "calm", "sustainable"],
    },
    Row {
        id: "style-pop-color",
        name: "Pop Color Block",
        description: "Saturated seamless backgrounds, graphic shadows",
        sectors: &["fashion", "beverage", "lifestyle"],
        categories: &["sneakers", "soda", "accessories"],
        moods: &["playful", "bold", "youthful"],
    },
];

const PALETTES: &[Row] = &[
    Row {
        id: "palette-brand-dominant",
        name: "Brand Dominant",
        description: "Brand colors carry 70% of the frame",
        sectors: &["all"],
        categories: &[],
        moods: &["bold", "recognizable"],
    },
    Row {
        id: "palette-warm-earth",
        name: "Warm Earth Tones",
        description: "Terracotta, sand and olive",
        sectors: &["food", "wellness", "lifestyle"],
        categories: &["organic", "coffee", "tea"],
        moods: &["warm", "natural", "cozy"],
    },
    Row {
        id: "palette-cool-tech",
        name: "Cool Tech Neutrals",
        description: "Graphite, silver and ice blue",
        sectors: &["tech"],
        categories: &["electronics", "audio"],
        moods: &["clean", "innovative", "minimal"],
    },
    Row {
        id: "palette-pastel-soft",
        name: "Soft Pastels",
        description: "Blush, mint and butter yellow",
        sectors: &["cosmetic", "fashion"],
        categories: &["skincare", "makeup"],
        moods: &["gentle", "selfcare", "spring"],
    },
    Row {
        id: "palette-vibrant-summer",
        name: "Vibrant Summer",
        description: "Citrus orange, turquoise, sunny yellow",
        sectors: &["beverage", "food"],
        categories: &["soda", "juice", "snack"],
        moods: &["summer", "energetic", "refreshing"],
    },
    Row {
        id: "palette-monochrome-lux",
        name: "Monochrome Luxury",
        description: "Black, charcoal and gold accents",
        sectors: &["fashion", "beverage", "cosmetic"],
        categories: &["spirits", "watch", "fragrance"],
        moods: &["luxury", "premium", "night"],
    },
];

const CONTEXTS: &[Row] = &[
    Row {
        id: "context-modern-kitchen",
        name: "Bright Modern Kitchen",
        description: "Clean kitchen, natural light, home cooking",
        sectors: &["food", "beverage"],
        categories: &["meal", "snack", "coffee"],
        moods: &["everyday", "warm"],
    },
    Row {
        id: "context-family-table",
        name: "Family Table",
        description: "Shared dining moment, togetherness",
        sectors: &["food", "beverage"],
        categories: &["meal"],
        moods: &["family", "friendly", "warm"],
    },
    Row {
        id: "context-urban-cafe",
        name: "Urban Cafe",
        description: "Coffee shop setting, social gathering",
        sectors: &["food", "beverage", "lifestyle"],
        categories: &["coffee", "pastry"],
        moods: &["social", "urban"],
    },
    Row {
        id: "context-pool-party",
        name: "Pool Party",
        description: "Summer refreshment, vacation mode",
        sectors: &["beverage"],
        categories: &["soda", "juice", "water"],
        moods: &["summer", "party", "refreshing"],
    },
    Row {
        id: "context-gym-workout",
        name: "Post-Workout Gym",
        description: "Active lifestyle, recovery moment",
        sectors: &["beverage", "wellness"],
        categories: &["water", "protein"],
        moods: &["energetic", "active"],
    },
    Row {
        id: "context-bathroom-ritual",
        name: "Bathroom Morning Ritual",
        description: "Self-care routine in a modern bathroom",
        sectors: &["cosmetic", "wellness"],
        categories: &["skincare", "serum"],
        moods: &["selfcare", "calm"],
    },
    Row {
        id: "context-home-office",
        name: "Home Office",
        description: "Remote setup, productivity fuel",
        sectors: &["tech", "lifestyle"],
        categories: &["electronics", "coffee"],
        moods: &["focused", "productive"],
    },
    Row {
        id: "context-city-night",
        name: "City at Night",
        description: "Neon reflections, urban after-hours",
        sectors: &["fashion", "beverage", "tech"],
        categories: &["spirits", "audio", "sneakers"],
        moods: &["night", "urban", "dramatic"],
    },
    Row {
        id: "context-studio-neutral",
        name: "Professional Studio",
        description: "Controlled environment, product focus",
        sectors: &["all"],
        categories: &[],
        moods: &["clean"],
    },
    Row {
        id: "context-outdoor-nature",
        name: "Outdoor Nature",
        description: "Natural setting, environmental backdrop",
        sectors: &["all"],
        categories: &[],
        moods: &["natural", "fresh"],
    },
];

const LIGHTINGS: &[Row] = &[
    Row {
        id: "lighting-golden-morning",
        name: "Golden Hour Morning",
        description: "Warm low sun, soft shadows, fresh start",
        sectors: &["all"],
        categories: &[],
        moods: &["fresh", "optimistic", "morning"],
    },
    Row {
        id: "lighting-bright-midday",
        name: "Bright Midday",
        description: "Hard direct light, crisp shadows",
        sectors: &["all"],
        categories: &[],
        moods: &["energetic", "summer", "vibrant"],
    },
    Row {
        id: "lighting-afternoon-soft",
        name: "Afternoon Soft",
        description: "Diffused warm light",
        sectors: &["all"],
        categories: &[],
        moods: &["comfortable", "productive"],
    },
    Row {
        id: "lighting-golden-evening",
        name: "Golden Hour Evening",
        description: "Long shadows, cinematic glow",
        sectors: &["all"],
        categories: &[],
        moods: &["romantic", "nostalgic", "warm"],
    },
    Row {
        id: "lighting-blue-hour",
        name: "Blue Hour",
        description: "Cool twilight ambience",
        sectors: &["all"],
        categories: &[],
        moods: &["calm", "contemplative"],
    },
    Row {
        id: "lighting-night-ambiance",
        name: "Night Ambiance",
        description: "Practical lights, intimate glow",
        sectors: &["all"],
        categories: &[],
        moods: &["night", "cozy", "intimate"],
    },
    Row {
        id: "lighting-overcast",
        name: "Overcast Soft",
        description: "Even softbox-like daylight",
        sectors: &["all"],
        categories: &[],
        moods: &["clean", "reliable"],
    },
];

const FRAMEWORKS: &[Row] = &[
    Row {
        id: "framework-aida",
        name: "AIDA",
        description: "Attention, interest, desire, action",
        sectors: &["all"],
        categories: &[],
        moods: &["conversion", "promotion"],
    },
    Row {
        id: "framework-pas",
        name: "PAS",
        description: "Problem, agitate, solution",
        sectors: &["all"],
        categories: &[],
        moods: &["problem", "solution"],
    },
    Row {
        id: "framework-storytelling",
        name: "Narrative Storytelling",
        description: "Beginning, middle, end with a transformation arc",
        sectors: &["all"],
        categories: &[],
        moods: &["emotional", "storytelling", "brand"],
    },
    Row {
        id: "framework-question",
        name: "Question and Answer",
        description: "Provocative question resolved by the product",
        sectors: &["all"],
        categories: &[],
        moods: &["curiosity", "engagement"],
    },
    Row {
        id: "framework-social-proof",
        name: "Social Proof Testimonial",
        description: "Authentic customer voice and tangible result",
        sectors: &["all"],
        categories: &[],
        moods: &["authentic", "trust"],
    },
    Row {
        id: "framework-before-after",
        name: "Before / After",
        description: "Clear transformation with strong contrast",
        sectors: &["cosmetic", "wellness", "tech"],
        categories: &["skincare"],
        moods: &["transformation", "results"],
    },
    Row {
        id: "framework-step-by-step",
        name: "Step-by-Step",
        description: "Decomposed how-to process",
        sectors: &["all"],
        categories: &[],
        moods: &["educational", "howto"],
    },
];

const ANGLES: &[Row] = &[
    Row {
        id: "angle-product-hero",
        name: "Product Hero Reveal",
        description: "The product is the protagonist of the shot",
        sectors: &["all"],
        categories: &[],
        moods: &["premium", "launch"],
    },
    Row {
        id: "angle-day-in-life",
        name: "Day in the Life",
        description: "Follows a user through a real day",
        sectors: &["lifestyle", "food", "beverage", "tech"],
        categories: &[],
        moods: &["everyday", "authentic"],
    },
    Row {
        id: "angle-problem-solver",
        name: "Problem Solver",
        description: "Everyday friction resolved by the product",
        sectors: &["all"],
        categories: &[],
        moods: &["solution", "practical"],
    },
    Row {
        id: "angle-sensory",
        name: "Sensory Immersion",
        description: "Textures, sounds and close details",
        sectors: &["food", "beverage", "cosmetic"],
        categories: &[],
        moods: &["sensorial", "appetizing"],
    },
    Row {
        id: "angle-behind-scenes",
        name: "Behind the Scenes",
        description: "How the product is made",
        sectors: &["all"],
        categories: &[],
        moods: &["craft", "authentic"],
    },
    Row {
        id: "angle-celebration",
        name: "Shared Celebration",
        description: "Product at the center of a social moment",
        sectors: &["beverage", "food", "lifestyle"],
        categories: &[],
        moods: &["party", "social", "summer"],
    },
];

const TECHNIQUES: &[Row] = &[
    Row {
        id: "technique-slow-motion",
        name: "Slow Motion Macro",
        description: "High frame rate detail shots",
        sectors: &["all"],
        categories: &[],
        moods: &["sensorial", "premium"],
    },
    Row {
        id: "technique-drone-sweep",
        name: "Drone Sweep",
        description: "Aerial establishing movement",
        sectors: &["all"],
        categories: &[],
        moods: &["epic", "outdoor"],
    },
    Row {
        id: "technique-orbit",
        name: "360 Orbit",
        description: "Camera circles the product",
        sectors: &["tech", "fashion", "cosmetic"],
        categories: &[],
        moods: &["premium", "launch"],
    },
    Row {
        id: "technique-handheld",
        name: "Handheld Documentary",
        description: "Natural shake, observational framing",
        sectors: &["all"],
        categories: &[],
        moods: &["authentic", "everyday"],
    },
    Row {
        id: "technique-stop-motion",
        name: "Stop Motion",
        description: "Frame-by-frame playful animation",
        sectors: &["food", "lifestyle", "fashion"],
        categories: &[],
        moods: &["playful", "youthful"],
    },
    Row {
        id: "technique-dolly-zoom",
        name: "Dolly Zoom",
        description: "Vertigo effect for a reveal",
        sectors: &["all"],
        categories: &[],
        moods: &["dramatic"],
    },
];

const CONCEPTS: &[Row] = &[
    Row {
        id: "concept-heros-journey",
        name: "Hero's Journey",
        description: "Call, struggle, triumph",
        sectors: &["all"],
        categories: &[],
        moods: &["emotional", "storytelling"],
    },
    Row {
        id: "concept-transformation",
        name: "Transformation",
        description: "A visible before and after",
        sectors: &["all"],
        categories: &[],
        moods: &["transformation", "results"],
    },
    Row {
        id: "concept-product-birth",
        name: "Product Birth",
        description: "From raw ingredients to finished product",
        sectors: &["food", "beverage", "cosmetic"],
        categories: &[],
        moods: &["craft", "natural"],
    },
    Row {
        id: "concept-seasonal",
        name: "Seasonal Integration",
        description: "Product tied to the current season",
        sectors: &["all"],
        categories: &[],
        moods: &["summer", "winter", "seasonal"],
    },
    Row {
        id: "concept-cultural-moment",
        name: "Cultural Moment",
        description: "Anchored in a local tradition or event",
        sectors: &["all"],
        categories: &[],
        moods: &["social", "local"],
    },
    Row {
        id: "concept-innovation",
        name: "Innovation Showcase",
        description: "Technology or formula as the star",
        sectors: &["tech", "cosmetic"],
        categories: &[],
        moods: &["innovative", "launch"],
    },
    Row {
        id: "concept-social-proof",
        name: "Social Proof",
        description: "Real customers and their reactions",
        sectors: &["all"],
        categories: &[],
        moods: &["trust", "authentic"],
    },
];

fn rows(
    dimension: Dimension,
    table: &[Row],
) -> impl Iterator<Item = CreativeDimensionValue> + '_ {
    table.iter().map(move |row| CreativeDimensionValue {
        id: row.id.to_string(),
        name: row.name.to_string(),
        dimension,
        description: row.description.to_string(),
        sector_tags: row.sectors.iter().map(|s| s.to_string()).collect(),
        category_tags: row.categories.iter().map(|s| s.to_string()).collect(),
        mood_tags: row.moods.iter().map(|s| s.to_string()).collect(),
        attributes: Default::default(),
    })
}

impl PresetCatalog {
    /// The built-in image and video catalog.
    pub fn builtin() -> DiversityResult<Self> {
        let values = rows(Dimension::Style, STYLES)
            .chain(rows(Dimension::Palette, PALETTES))
            .chain(rows(Dimension::Context, CONTEXTS))
            .chain(rows(Dimension::Lighting, LIGHTINGS))
            .chain(rows(Dimension::Framework, FRAMEWORKS))
            .chain(rows(Dimension::Angle, ANGLES))
            .chain(rows(Dimension::Technique, TECHNIQUES))
            .chain(rows(Dimension::Concept, CONCEPTS));
        Self::from_values(values)
    }
}
