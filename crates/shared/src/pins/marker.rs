use std::fmt;
use std::rc::Rc;

use crate::models::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum IdKind {
    Marker,
    Cluster,
}

/// Identifier of an annotation on the map surface: a marker or a cluster.
///
/// Cluster ids live in their own namespace, so no marker id can equal one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId {
    kind: IdKind,
    key: String,
}

impl AnnotationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            kind: IdKind::Marker,
            key: id.into(),
        }
    }

    /// Cluster ids are derived from the id of the cluster's first member.
    pub fn cluster_of(first_member: &AnnotationId) -> Self {
        Self {
            kind: IdKind::Cluster,
            key: first_member.key.clone(),
        }
    }

    /// The marker id, or for a cluster the id of its first member.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn is_cluster(&self) -> bool {
        self.kind == IdKind::Cluster
    }

    /// Key that stays unique across markers and clusters, for keyed rendering.
    pub fn render_key(&self) -> String {
        match self.kind {
            IdKind::Marker => format!("m:{}", self.key),
            IdKind::Cluster => format!("c:{}", self.key),
        }
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IdKind::Marker => f.write_str(&self.key),
            IdKind::Cluster => write!(f, "cluster:{}", self.key),
        }
    }
}

impl From<&str> for AnnotationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AnnotationId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Things a callout lets the user do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalloutAction {
    /// Open the details panel for a marker.
    Details(AnnotationId),
    /// Open the reviews panel for a marker.
    Reviews(AnnotationId),
    /// Leave a cluster list and open one member's own callout.
    View(AnnotationId),
    /// Fit the viewport around every member of a cluster.
    ZoomToFit(AnnotationId),
}

impl CalloutAction {
    pub fn label(&self) -> &'static str {
        match self {
            CalloutAction::Details(_) => "Details",
            CalloutAction::Reviews(_) => "Reviews",
            CalloutAction::View(_) => "View",
            CalloutAction::ZoomToFit(_) => "Zoom to See All",
        }
    }
}

/// One row of a cluster callout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutEntry {
    pub marker_id: AnnotationId,
    pub title: String,
    pub subtitle: Option<String>,
    pub action: CalloutAction,
}

/// Renderer-independent description of what a callout shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalloutContent {
    Location {
        title: String,
        subtitle: Option<String>,
        body: Option<String>,
        actions: Vec<CalloutAction>,
    },
    ClusterList {
        heading: String,
        entries: Vec<CalloutEntry>,
        zoom_action: CalloutAction,
    },
}

impl CalloutContent {
    /// Default content for a marker without its own generator.
    pub fn location(marker: &Marker) -> Self {
        CalloutContent::Location {
            title: marker.display_title().to_string(),
            subtitle: marker.subtitle.clone(),
            body: None,
            actions: vec![
                CalloutAction::Details(marker.id.clone()),
                CalloutAction::Reviews(marker.id.clone()),
            ],
        }
    }
}

pub type CalloutFn = Rc<dyn Fn(&Marker) -> CalloutContent>;

/// A point of interest supplied by the application.
#[derive(Clone)]
pub struct Marker {
    pub id: AnnotationId,
    pub coordinate: Coordinate,
    pub title: String,
    pub subtitle: Option<String>,
    /// Provisional pin shown while the user composes a new entry.
    pub temporary: bool,
    callout: Option<CalloutFn>,
}

impl Marker {
    pub fn new(id: impl Into<AnnotationId>, coordinate: Coordinate, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            coordinate,
            title: title.into(),
            subtitle: None,
            temporary: false,
            callout: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn into_temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn with_callout(mut self, generator: impl Fn(&Marker) -> CalloutContent + 'static) -> Self {
        self.callout = Some(Rc::new(generator));
        self
    }

    /// Title with the fallback used when a marker has none.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Location"
        } else {
            &self.title
        }
    }

    pub fn callout(&self) -> CalloutContent {
        match &self.callout {
            Some(generator) => generator(self),
            None => CalloutContent::location(self),
        }
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("id", &self.id)
            .field("coordinate", &self.coordinate)
            .field("title", &self.title)
            .field("subtitle", &self.subtitle)
            .field("temporary", &self.temporary)
            .field("has_callout", &self.callout.is_some())
            .finish()
    }
}

/// Markers compare by their data; two generators are never compared.
impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.coordinate == other.coordinate
            && self.title == other.title
            && self.subtitle == other.subtitle
            && self.temporary == other.temporary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> Marker {
        Marker::new("m1", Coordinate::new(1.0, 2.0), "Board game night").with_subtitle("Catan")
    }

    #[test]
    fn test_cluster_id_derivation() {
        let id = AnnotationId::cluster_of(&AnnotationId::new("m1"));
        assert_eq!(id.to_string(), "cluster:m1");
        assert_eq!(id.as_str(), "m1");
        assert!(id.is_cluster());
        assert!(!AnnotationId::new("m1").is_cluster());
    }

    #[test]
    fn test_marker_id_cannot_impersonate_cluster() {
        let cluster = AnnotationId::cluster_of(&AnnotationId::new("a"));
        let lookalike = AnnotationId::new("cluster:a");
        assert_ne!(cluster, lookalike);
        assert!(!lookalike.is_cluster());
        assert_ne!(cluster.render_key(), lookalike.render_key());
    }

    #[test]
    fn test_default_callout_has_details_and_reviews() {
        let content = marker().callout();
        match content {
            CalloutContent::Location {
                title,
                subtitle,
                actions,
                ..
            } => {
                assert_eq!(title, "Board game night");
                assert_eq!(subtitle.as_deref(), Some("Catan"));
                assert_eq!(
                    actions,
                    vec![
                        CalloutAction::Details("m1".into()),
                        CalloutAction::Reviews("m1".into()),
                    ]
                );
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_custom_callout_generator() {
        let m = marker().with_callout(|m| CalloutContent::Location {
            title: m.title.to_uppercase(),
            subtitle: None,
            body: Some("Bring snacks".to_string()),
            actions: Vec::new(),
        });
        match m.callout() {
            CalloutContent::Location { title, body, .. } => {
                assert_eq!(title, "BOARD GAME NIGHT");
                assert_eq!(body.as_deref(), Some("Bring snacks"));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_blank_title_falls_back() {
        let m = Marker::new("m2", Coordinate::new(0.0, 0.0), "  ");
        assert_eq!(m.display_title(), "Location");
    }

    #[test]
    fn test_marker_equality_ignores_generator() {
        let plain = marker();
        let custom = marker().with_callout(CalloutContent::location);
        assert_eq!(plain, custom);
        assert_ne!(plain, marker().into_temporary());
    }
}
