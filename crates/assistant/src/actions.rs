//! Maps assistant actions onto navigation targets.

use crm_api::{encode_path_segment, AssistantAction};
use tracing::warn;
use url::form_urlencoded;

/// Receives navigation targets, typically the front end's router.
pub trait Navigator {
    fn navigate(&mut self, target: &str);
}

/// Collects targets in order; handy for tests and headless front ends.
impl Navigator for Vec<String> {
    fn navigate(&mut self, target: &str) {
        self.push(target.to_string());
    }
}

impl<N: Navigator + ?Sized> Navigator for &mut N {
    fn navigate(&mut self, target: &str) {
        (**self).navigate(target);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ViewClient,
    ViewOffer,
    CreateOffer,
    CreateFollowup,
    Navigate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::ViewClient,
        ActionKind::ViewOffer,
        ActionKind::CreateOffer,
        ActionKind::CreateFollowup,
        ActionKind::Navigate,
    ];

    /// `None` for kinds this build does not know about.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "view_client" => Some(Self::ViewClient),
            "view_offer" => Some(Self::ViewOffer),
            "create_offer" => Some(Self::CreateOffer),
            "create_followup" => Some(Self::CreateFollowup),
            "navigate" => Some(Self::Navigate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewClient => "view_client",
            Self::ViewOffer => "view_offer",
            Self::CreateOffer => "create_offer",
            Self::CreateFollowup => "create_followup",
            Self::Navigate => "navigate",
        }
    }
}

/// Target path for `action`, or `None` when the kind is unknown or a required
/// payload field is missing.
pub fn navigation_target(action: &AssistantAction) -> Option<String> {
    let kind = ActionKind::parse(&action.kind)?;
    match kind {
        ActionKind::ViewClient => {
            let client_id = payload_field(action, "clientId")?;
            Some(format!("/clients/{}", encode_path_segment(&client_id)))
        }
        ActionKind::ViewOffer => {
            let offer_id = payload_field(action, "offerId")?;
            Some(format!("/offers/{}", encode_path_segment(&offer_id)))
        }
        ActionKind::CreateOffer => Some(with_client_query(
            "/offers/new",
            payload_field(action, "clientId"),
        )),
        ActionKind::CreateFollowup => Some(with_client_query(
            "/followups/new",
            payload_field(action, "clientId"),
        )),
        ActionKind::Navigate => payload_field(action, "path"),
    }
}

/// Sends the action's target to `navigator`.
///
/// Unknown kinds and actions missing their payload are logged and ignored, so
/// kinds added by the backend later never break the front end.
pub fn resolve(action: &AssistantAction, navigator: &mut dyn Navigator) -> Option<String> {
    let Some(target) = navigation_target(action) else {
        match ActionKind::parse(&action.kind) {
            Some(kind) => warn!(kind = kind.as_str(), "action is missing its payload"),
            None => warn!(kind = %action.kind, "ignoring unknown action kind"),
        }
        return None;
    };

    navigator.navigate(&target);
    Some(target)
}

fn payload_field(action: &AssistantAction, key: &str) -> Option<String> {
    action
        .payload_str(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn with_client_query(path: &str, client_id: Option<String>) -> String {
    match client_id {
        Some(client_id) => {
            let query: String = form_urlencoded::Serializer::new(String::new())
                .append_pair("clientId", &client_id)
                .finish();
            format!("{path}?{query}")
        }
        None => path.to_string(),
    }
}
