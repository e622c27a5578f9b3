use crate::providers::{AdImageRequest, DetailRequest, DETAIL_COUNT};

pub const ANALYZE_PRODUCT: &str = "Describe the product in this photo for a marketing team. \
Name the product type, its materials, colors and finish, and any visible features a buyer would care about. \
Answer in 2-3 plain sentences without markdown.";

pub const SUGGEST_STYLES: &str = "You are an art director for product advertising. \
Look at the product in this photo and propose 3 photographic scene styles that would sell it. \
Return a JSON array. Each item has: \"name\" (short title), \"description\" (one sentence for the user), \
\"prompt\" (a detailed English scene prompt covering background, lighting and atmosphere), \
\"tags\" (3 short keywords) and \"previewColor\" (a hex color that represents the mood).";

/// Prompt for the composite poster.
pub fn ad_image(req: &AdImageRequest<'_>) -> String {
    let mut out = format!(
        "Create a professional advertising poster using the product in the attached photo. \
Keep the product's shape, proportions, color and details exactly as photographed. \
Show the product from this angle: {angle}. \
Scene: {style} \
Compose for a {ratio} frame with clean space for headline text. Photorealistic, commercial quality, sharp focus on the product.",
        angle = req.angle.describe(),
        style = req.style_prompt,
        ratio = req.aspect_ratio.as_ratio(),
    );
    if !req.description.trim().is_empty() {
        out.push_str(&format!(" Product notes: {}", req.description.trim()));
    }
    out
}

/// Prompt asking the model to plan the close-ups as JSON. Manual hints are quoted as given.
pub fn detail_plan(req: &DetailRequest<'_>) -> String {
    let mut out = format!(
        "Plan {DETAIL_COUNT} close-up detail shots that highlight selling points of the product in the photo. \
Return a JSON array of exactly {DETAIL_COUNT} items with \"focusPoint\" (the feature shown), \
\"caption\" (one persuasive marketing sentence) and \"prompt\" (an English image prompt for the close-up). \
Scene style for every shot: {style}",
        style = req.style_prompt,
    );
    if !req.description.trim().is_empty() {
        out.push_str(&format!("\nProduct notes: {}", req.description.trim()));
    }
    for (i, point) in req.focus_points.as_slice().iter().enumerate() {
        if point.trim().is_empty() {
            continue;
        }
        out.push_str(&format!(
            "\nShot {n} must feature exactly: \"{point}\". Use that text verbatim as its focusPoint.",
            n = i + 1,
        ));
    }
    out
}

/// Prompt for rendering a single planned close-up.
pub fn detail_image(style_prompt: &str, shot_prompt: &str, focus_point: &str) -> String {
    format!(
        "Macro product photograph of the product in the attached photo, focusing on: {focus_point}. \
{shot_prompt} Keep materials and colors true to the original product. \
Background and lighting follow this style: {style_prompt} Shallow depth of field, square frame."
    )
}
