use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::constants::{CRITERIA_COUNT, CRITERIA_PER_LEVEL, LEVEL_COUNT};

use super::error::CriteriaError;

macro_rules! criteria {
    ($($variant:ident => $name:literal, $doc:literal;)+) => {
        /// One of the 30 fixed agent-friendliness checks.
        ///
        /// Declaration order is significant: criteria are grouped into levels as
        /// contiguous runs of [`CRITERIA_PER_LEVEL`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum CriterionId {
            $($variant,)+
        }

        impl CriterionId {
            /// Every criterion, in level order.
            pub const ALL: [CriterionId; CRITERIA_COUNT] = [$(CriterionId::$variant,)+];

            /// Wire name (`l1_semantic_html`, ...).
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(CriterionId::$variant => $name,)+
                }
            }

            /// One-sentence description shown to verifiers.
            pub const fn description(self) -> &'static str {
                match self {
                    $(CriterionId::$variant => $doc,)+
                }
            }
        }
    };
}

criteria! {
    SemanticHtml => "l1_semantic_html", "Uses semantic HTML elements (header, nav, main, article, section, footer) instead of just divs";
    MetaTags => "l1_meta_tags", "Has proper meta tags (title, description, og:tags, twitter:card)";
    SchemaOrg => "l1_schema_org", "Includes Schema.org JSON-LD structured data";
    NoCaptcha => "l1_no_captcha", "Does not block automated access with CAPTCHAs on public content";
    SsrContent => "l1_ssr_content", "Content is server-side rendered (visible in HTML source, not just JS-rendered)";
    CleanUrls => "l1_clean_urls", "Uses clean, readable URLs (no excessive query params or hash fragments)";

    RobotsTxt => "l2_robots_txt", "Has a robots.txt that allows legitimate bot access";
    Sitemap => "l2_sitemap", "Provides an XML sitemap";
    LlmsTxt => "l2_llms_txt", "Has a /llms.txt file describing the site for LLMs";
    OpenapiSpec => "l2_openapi_spec", "Publishes an OpenAPI/Swagger specification for its API";
    Documentation => "l2_documentation", "Has comprehensive, machine-readable documentation";
    TextContent => "l2_text_content", "Primary content is text-based (not locked in images/videos/PDFs)";

    StructuredApi => "l3_structured_api", "Provides a structured REST or GraphQL API";
    JsonResponses => "l3_json_responses", "API returns JSON responses with consistent schema";
    SearchFilterApi => "l3_search_filter_api", "API supports search and filtering parameters";
    A2aAgentCard => "l3_a2a_agent_card", "Has an A2A agent card at /.well-known/agent.json";
    RateLimitsDocumented => "l3_rate_limits_documented", "Rate limits are documented and return proper 429 responses with Retry-After";
    StructuredErrors => "l3_structured_errors", "API returns structured error responses with error codes and messages";

    McpServer => "l4_mcp_server", "Provides an MCP (Model Context Protocol) server";
    WebMcp => "l4_webmcp", "Supports WebMCP for browser-based agent interaction";
    WriteApi => "l4_write_api", "API supports write operations (POST/PUT/PATCH/DELETE), not just reads";
    AgentAuth => "l4_agent_auth", "Supports agent-friendly authentication (API keys, OAuth client credentials)";
    Webhooks => "l4_webhooks", "Supports webhooks for event notifications";
    Idempotency => "l4_idempotency", "Write operations support idempotency keys";

    EventStreaming => "l5_event_streaming", "Supports event streaming (SSE, WebSockets) for real-time updates";
    AgentNegotiation => "l5_agent_negotiation", "Supports agent-to-agent capability negotiation";
    SubscriptionApi => "l5_subscription_api", "Has a subscription/management API for agents";
    WorkflowOrchestration => "l5_workflow_orchestration", "Supports multi-step workflow orchestration";
    ProactiveNotifications => "l5_proactive_notifications", "Can proactively notify agents of relevant changes";
    CrossServiceHandoff => "l5_cross_service_handoff", "Supports cross-service handoff between agents";
}

impl CriterionId {
    /// Position in [`CriterionId::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Level (1..=5) this criterion counts toward.
    #[inline]
    pub const fn level(self) -> u8 {
        (self.index() / CRITERIA_PER_LEVEL) as u8 + 1
    }

    /// The six criteria of `level` (1..=5). Returns an empty slice for any other value.
    pub fn for_level(level: u8) -> &'static [CriterionId] {
        if level == 0 || level as usize > LEVEL_COUNT {
            return &[];
        }
        let start = (level as usize - 1) * CRITERIA_PER_LEVEL;
        &Self::ALL[start..start + CRITERIA_PER_LEVEL]
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriterionId {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CriteriaError::UnknownCriterion {
                name: s.to_string(),
            })
    }
}

/// Name → description for all 30 criteria, as handed to verifiers with their queue.
pub fn criteria_docs() -> BTreeMap<&'static str, &'static str> {
    CriterionId::ALL
        .iter()
        .map(|c| (c.as_str(), c.description()))
        .collect()
}

/// The 30 criterion booleans in [`CriterionId`] order.
///
/// Serializes as a JSON object keyed by criterion name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CriteriaSet([bool; CRITERIA_COUNT]);

impl CriteriaSet {
    /// All criteria false.
    pub const fn empty() -> Self {
        Self([false; CRITERIA_COUNT])
    }

    pub const fn from_array(values: [bool; CRITERIA_COUNT]) -> Self {
        Self(values)
    }

    /// Builds a set where exactly the given criteria are true.
    pub fn from_true<I: IntoIterator<Item = CriterionId>>(ids: I) -> Self {
        let mut set = Self::empty();
        for id in ids {
            set.set(id, true);
        }
        set
    }

    #[inline]
    pub fn get(&self, id: CriterionId) -> bool {
        self.0[id.index()]
    }

    #[inline]
    pub fn set(&mut self, id: CriterionId, value: bool) {
        self.0[id.index()] = value;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, id: CriterionId, value: bool) -> Self {
        self.set(id, value);
        self
    }

    pub fn as_array(&self) -> &[bool; CRITERIA_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (CriterionId, bool)> + '_ {
        CriterionId::ALL.iter().map(move |&id| (id, self.get(id)))
    }

    /// Number of true criteria within `level` (1..=5).
    pub fn passed_in_level(&self, level: u8) -> usize {
        CriterionId::for_level(level)
            .iter()
            .filter(|&&id| self.get(id))
            .count()
    }

    pub fn count_true(&self) -> usize {
        self.0.iter().filter(|&&v| v).count()
    }

    /// Parses a submitted criteria payload.
    ///
    /// Unsupplied criteria default to false and unknown keys are ignored, but the
    /// object must name at least one criterion and every named criterion must be a
    /// boolean.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CriteriaError> {
        let object = value.as_object().ok_or(CriteriaError::NotAnObject)?;

        let mut set = Self::empty();
        let mut recognised = 0usize;
        for id in CriterionId::ALL {
            let Some(raw) = object.get(id.as_str()) else {
                continue;
            };
            let flag = raw.as_bool().ok_or_else(|| CriteriaError::NotABoolean {
                field: id.as_str().to_string(),
            })?;
            set.set(id, flag);
            recognised += 1;
        }

        if recognised == 0 {
            return Err(CriteriaError::NoRecognisedFields);
        }
        Ok(set)
    }
}

impl Serialize for CriteriaSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CRITERIA_COUNT))?;
        for (id, value) in self.iter() {
            map.serialize_entry(id.as_str(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CriteriaSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
        let mut set = CriteriaSet::empty();
        for (name, value) in raw {
            if let Ok(id) = name.parse::<CriterionId>() {
                set.set(id, value);
            }
        }
        Ok(set)
    }
}
