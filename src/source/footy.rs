//! Two-phase "footy renders" source.
//!
//! Phase one asks the text model for plausible player render-page links
//! for a team (a stand-in for scraping a render site). Phase two derives a
//! player name from each confirmed link and generates one render for it.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::image::ImageCandidate;

use super::{AdapterError, GeminiClient, LinkSource, underscore_whitespace};

/// Roughly how many player links one listing page yields.
pub const LINKS_PER_PAGE: u32 = 15;

const OUTPUT_MIME: &str = "image/png";
const ASPECT_RATIO: &str = "3:4";
const IMAGE_WIDTH: u32 = 768;
const IMAGE_HEIGHT: u32 = 1024;
const FALLBACK_PLAYER: &str = "player";

static CODE_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```(?:json)?").ok());

/// Derives a display player name from a render-page link.
///
/// `https://www.footyrenders.com/render/render-bukayo-saka` → `bukayo saka`.
#[must_use]
pub fn player_name_from_link(link: &str) -> String {
    let segment = link
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let segment = segment
        .strip_prefix("render-")
        .unwrap_or(segment)
        .replace('-', " ");
    let segment = segment.trim();
    if segment.is_empty() {
        FALLBACK_PLAYER.to_string()
    } else {
        segment.to_string()
    }
}

/// Parses the model's reply into a list of links. Anything that is not a
/// JSON array of strings yields an empty list.
pub(crate) fn parse_link_reply(reply: &str) -> Vec<String> {
    let cleaned = match CODE_FENCE.as_ref() {
        Some(re) => re.replace_all(reply, "").into_owned(),
        None => reply.to_string(),
    };
    match serde_json::from_str::<Vec<String>>(cleaned.trim()) {
        Ok(links) => links
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        Err(error) => {
            warn!(error = %error, "link collection reply was not a JSON string array");
            Vec::new()
        }
    }
}

fn collection_prompt(team: &str, max_pages: u32) -> String {
    let approx = LINKS_PER_PAGE.saturating_mul(max_pages);
    format!(
        "You are simulating a web scraper for the website footyrenders.com. \
         Your task is to find the URLs for individual player render pages for the team \"{team}\". \
         The team page lists players, and you should simulate scraping up to {max_pages} page(s) of results. \
         Generate a plausible list of about {approx} URLs for player render pages for this team. \
         The URLs should follow a realistic format, like 'https://www.footyrenders.com/render/render-player-name'. \
         Return only a JSON array of strings, where each string is a URL."
    )
}

fn render_prompt(player: &str, team: &str) -> String {
    format!(
        "A high-quality, professional photorealistic render of the football player {player} \
         from the team {team}. The player should be in their team's official kit, in a dynamic pose. \
         The background must be transparent or a solid neutral color suitable for cutouts."
    )
}

/// Link collection plus per-link render synthesis over the Gemini API.
#[derive(Debug, Clone)]
pub struct FootySource {
    gemini: GeminiClient,
}

impl FootySource {
    #[must_use]
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }
}

#[async_trait]
impl LinkSource for FootySource {
    fn name(&self) -> &str {
        "Footy Renders"
    }

    #[instrument(skip(self))]
    async fn collect_links(&self, team: &str, max_pages: u32) -> Result<Vec<String>, AdapterError> {
        let schema = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
        let reply = self
            .gemini
            .generate_json_text(&collection_prompt(team, max_pages), schema)
            .await?;
        let links = parse_link_reply(&reply);
        debug!(links = links.len(), "link collection done");
        Ok(links)
    }

    #[instrument(skip(self))]
    async fn synthesize_one(
        &self,
        link: &str,
        team: &str,
    ) -> Result<Option<ImageCandidate>, AdapterError> {
        let player = player_name_from_link(link);
        let images = self
            .gemini
            .generate_images(&render_prompt(&player, team), 1, OUTPUT_MIME, ASPECT_RATIO)
            .await?;
        Ok(images.into_iter().next().map(|image| {
            let url = image.data_url();
            ImageCandidate {
                name: format!("{}.png", underscore_whitespace(&player)),
                thumb_url: url.clone(),
                url,
                width: IMAGE_WIDTH,
                height: IMAGE_HEIGHT,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name_from_render_link() {
        assert_eq!(
            player_name_from_link("https://www.footyrenders.com/render/render-bukayo-saka"),
            "bukayo saka"
        );
        assert_eq!(
            player_name_from_link("https://www.footyrenders.com/render/declan-rice/"),
            "declan rice"
        );
    }

    #[test]
    fn test_player_name_keeps_inner_render_text() {
        assert_eq!(
            player_name_from_link("https://x/render/render-surrender-smith"),
            "surrender smith"
        );
        assert_eq!(
            player_name_from_link("https://x/render/leo-render-jones"),
            "leo render jones"
        );
    }

    #[test]
    fn test_player_name_fallback() {
        assert_eq!(player_name_from_link(""), "player");
        assert_eq!(player_name_from_link("https://x/render/render-"), "player");
    }

    #[test]
    fn test_parse_link_reply_plain_array() {
        let links = parse_link_reply(r#"["https://a/render-x", " https://a/render-y "]"#);
        assert_eq!(links, vec!["https://a/render-x", "https://a/render-y"]);
    }

    #[test]
    fn test_parse_link_reply_strips_code_fences() {
        let reply = "```json\n[\"https://a/render-x\"]\n```";
        assert_eq!(parse_link_reply(reply), vec!["https://a/render-x"]);
    }

    #[test]
    fn test_parse_link_reply_garbage_is_empty() {
        assert!(parse_link_reply("sorry, I cannot do that").is_empty());
        assert!(parse_link_reply(r#"{"links": []}"#).is_empty());
    }

    #[test]
    fn test_collection_prompt_scales_with_pages() {
        let prompt = collection_prompt("Arsenal", 2);
        assert!(prompt.contains("\"Arsenal\""));
        assert!(prompt.contains("about 30 URLs"));
    }
}
