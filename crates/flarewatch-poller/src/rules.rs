//! Best-effort lookup of firewall rule descriptions.

use serde::Deserialize;

use std::collections::HashMap;

use crate::client::{ApiError, CloudflareClient};

/// Maximum length of a rule label in bytes.
pub const MAX_RULE_LABEL_LEN: usize = 200;
const ZONE_RULESET_KIND: &str = "zone";

/// Normalizes free-text rule descriptions for use as a label value: lower-cases the text, replaces spaces
/// with `_` and truncates the result to [`MAX_RULE_LABEL_LEN`] bytes on a char boundary.
pub fn normalize_rule_name(description: &str) -> String {
    let mut normalized = description.to_lowercase().replace(' ', "_");
    if normalized.len() > MAX_RULE_LABEL_LEN {
        let mut end = MAX_RULE_LABEL_LEN;
        while !normalized.is_char_boundary(end) {
            end -= 1;
        }
        normalized.truncate(end);
    }
    normalized
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    id: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RulesetEntry {
    id: String,
    #[serde(default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Ruleset {
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

/// Descriptions of firewall rules for a single zone, keyed by rule ID.
#[derive(Debug, Default, Clone)]
pub struct RuleDescriptions(HashMap<String, String>);

impl From<HashMap<String, String>> for RuleDescriptions {
    fn from(descriptions: HashMap<String, String>) -> Self {
        Self(descriptions)
    }
}

impl RuleDescriptions {
    /// Fetches descriptions of legacy firewall rules and rules from zone rulesets.
    /// Failures are logged and produce an empty table.
    pub async fn fetch(client: &CloudflareClient, zone_id: &str) -> Self {
        match Self::try_fetch(client, zone_id).await {
            Ok(descriptions) => {
                tracing::debug!(zone_id, len = descriptions.0.len(), "Fetched firewall rules");
                descriptions
            }
            Err(err) => {
                tracing::warn!(
                    zone_id,
                    %err,
                    "Failed fetching firewall rules; rule IDs will be used as labels"
                );
                Self::default()
            }
        }
    }

    async fn try_fetch(client: &CloudflareClient, zone_id: &str) -> Result<Self, ApiError> {
        let mut descriptions = HashMap::new();

        let legacy_rules: Vec<RuleEntry> = client
            .get_all_pages(&format!("/zones/{zone_id}/firewall/rules"))
            .await?;
        Self::extend(&mut descriptions, legacy_rules);

        let rulesets: Vec<RulesetEntry> =
            client.get(&format!("/zones/{zone_id}/rulesets")).await?;
        for entry in rulesets.iter().filter(|rs| rs.kind == ZONE_RULESET_KIND) {
            let ruleset: Ruleset = client
                .get(&format!("/zones/{zone_id}/rulesets/{}", entry.id))
                .await?;
            Self::extend(&mut descriptions, ruleset.rules);
        }
        Ok(Self(descriptions))
    }

    fn extend(descriptions: &mut HashMap<String, String>, rules: Vec<RuleEntry>) {
        let rules = rules.into_iter().filter_map(|rule| {
            let description = rule.description.filter(|desc| !desc.is_empty())?;
            Some((rule.id, description))
        });
        descriptions.extend(rules);
    }

    /// Returns the normalized label for the specified rule. Falls back to the raw rule ID
    /// if the description is unknown.
    pub fn describe(&self, rule_id: &str) -> String {
        normalize_rule_name(self.0.get(rule_id).map_or(rule_id, String::as_str))
    }
}
