use crate::models::{Coordinate, ScreenPoint};

use super::marker::{AnnotationId, CalloutAction, CalloutContent, CalloutEntry, Marker};

/// Clusters draw above plain pins.
pub const CLUSTER_DISPLAY_PRIORITY: u32 = 1000;
pub const MARKER_DISPLAY_PRIORITY: u32 = 500;

/// Synthetic marker standing in for two or more nearby markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: AnnotationId,
    pub coordinate: Coordinate,
    pub members: Vec<Marker>,
}

impl Cluster {
    /// Build a cluster from a proximity group. Returns `None` for empty groups.
    pub fn from_members(members: Vec<Marker>) -> Option<Self> {
        let coordinate = centroid(&members)?;
        let id = AnnotationId::cluster_of(&members[0].id);
        Some(Self {
            id,
            coordinate,
            members,
        })
    }

    /// Glyph drawn on the cluster pin.
    pub fn label(&self) -> String {
        self.members.len().to_string()
    }

    pub fn member(&self, id: &AnnotationId) -> Option<&Marker> {
        self.members.iter().find(|m| &m.id == id)
    }

    pub fn callout(&self) -> CalloutContent {
        CalloutContent::ClusterList {
            heading: format!("{} Locations", self.members.len()),
            entries: self
                .members
                .iter()
                .map(|m| CalloutEntry {
                    marker_id: m.id.clone(),
                    title: m.display_title().to_string(),
                    subtitle: m.subtitle.clone(),
                    action: CalloutAction::View(m.id.clone()),
                })
                .collect(),
            zoom_action: CalloutAction::ZoomToFit(self.id.clone()),
        }
    }
}

/// Arithmetic mean of the markers' latitudes and longitudes.
pub fn centroid(markers: &[Marker]) -> Option<Coordinate> {
    if markers.is_empty() {
        return None;
    }
    let n = markers.len() as f64;
    let (lat, lng) = markers.iter().fold((0.0, 0.0), |(lat, lng), m| {
        (lat + m.coordinate.latitude, lng + m.coordinate.longitude)
    });
    Some(Coordinate::new(lat / n, lng / n))
}

/// What the manager puts on the map: a plain marker or a cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUnit {
    Marker(Marker),
    Cluster(Cluster),
}

impl DisplayUnit {
    pub fn id(&self) -> &AnnotationId {
        match self {
            DisplayUnit::Marker(m) => &m.id,
            DisplayUnit::Cluster(c) => &c.id,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        match self {
            DisplayUnit::Marker(m) => m.coordinate,
            DisplayUnit::Cluster(c) => c.coordinate,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, DisplayUnit::Marker(m) if m.temporary)
    }

    /// Number of application markers this unit represents.
    pub fn marker_count(&self) -> usize {
        match self {
            DisplayUnit::Marker(_) => 1,
            DisplayUnit::Cluster(c) => c.members.len(),
        }
    }

    pub fn display_priority(&self) -> u32 {
        match self {
            DisplayUnit::Marker(_) => MARKER_DISPLAY_PRIORITY,
            DisplayUnit::Cluster(_) => CLUSTER_DISPLAY_PRIORITY,
        }
    }

    pub fn callout(&self) -> CalloutContent {
        match self {
            DisplayUnit::Marker(m) => m.callout(),
            DisplayUnit::Cluster(c) => c.callout(),
        }
    }

    /// Find an application marker by id, looking inside clusters too.
    pub fn find_marker(&self, id: &AnnotationId) -> Option<&Marker> {
        match self {
            DisplayUnit::Marker(m) => (&m.id == id).then_some(m),
            DisplayUnit::Cluster(c) => c.member(id),
        }
    }
}

struct Group {
    anchor: Option<ScreenPoint>,
    members: Vec<Marker>,
}

/// Partition markers by on-screen proximity.
///
/// Markers are visited in input order. Each joins the first group whose
/// first-inserted marker lies within `threshold` pixels, otherwise it starts a
/// new group. A marker that `project` cannot place gets a group of its own that
/// nothing else can join.
pub fn group_by_proximity<F>(markers: Vec<Marker>, threshold: f64, mut project: F) -> Vec<Vec<Marker>>
where
    F: FnMut(&Marker) -> Option<ScreenPoint>,
{
    let mut groups: Vec<Group> = Vec::new();

    for marker in markers {
        let Some(point) = project(&marker) else {
            groups.push(Group {
                anchor: None,
                members: vec![marker],
            });
            continue;
        };

        let nearby = groups.iter_mut().find(|g| {
            g.anchor
                .is_some_and(|anchor| anchor.distance_to(point) <= threshold)
        });
        match nearby {
            Some(group) => group.members.push(marker),
            None => groups.push(Group {
                anchor: Some(point),
                members: vec![marker],
            }),
        }
    }

    groups.into_iter().map(|g| g.members).collect()
}

/// Turn proximity groups into display units: singletons stay markers,
/// larger groups become clusters.
pub fn units_from_groups(groups: Vec<Vec<Marker>>) -> Vec<DisplayUnit> {
    groups
        .into_iter()
        .filter_map(|mut group| match group.len() {
            0 => None,
            1 => group.pop().map(DisplayUnit::Marker),
            _ => Cluster::from_members(group).map(DisplayUnit::Cluster),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Markers laid out so that longitude is the x pixel and latitude the y pixel.
    fn at(id: &str, x: f64, y: f64) -> Marker {
        Marker::new(id, Coordinate::new(y, x), id)
    }

    fn flat(m: &Marker) -> Option<ScreenPoint> {
        Some(ScreenPoint::new(m.coordinate.longitude, m.coordinate.latitude))
    }

    fn ids(group: &[Marker]) -> Vec<&str> {
        group.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_groups_close_pair_and_far_single() {
        let markers = vec![at("a", 0.0, 0.0), at("b", 5.0, 0.0), at("c", 200.0, 0.0)];
        let groups = group_by_proximity(markers, 40.0, flat);
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[0]), vec!["a", "b"]);
        assert_eq!(ids(&groups[1]), vec!["c"]);
    }

    #[test]
    fn test_distance_is_measured_from_first_member() {
        // b is within reach of a, c is within reach of b but not of a.
        let markers = vec![at("a", 0.0, 0.0), at("b", 30.0, 0.0), at("c", 60.0, 0.0)];
        let groups = group_by_proximity(markers, 40.0, flat);
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[0]), vec!["a", "b"]);
        assert_eq!(ids(&groups[1]), vec!["c"]);
    }

    #[test]
    fn test_joins_first_matching_group() {
        let markers = vec![at("a", 0.0, 0.0), at("b", 50.0, 0.0), at("c", 25.0, 0.0)];
        let groups = group_by_proximity(markers, 30.0, flat);
        assert_eq!(ids(&groups[0]), vec!["a", "c"]);
        assert_eq!(ids(&groups[1]), vec!["b"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let markers = vec![at("a", 0.0, 0.0), at("b", 40.0, 0.0)];
        let groups = group_by_proximity(markers, 40.0, flat);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_unprojectable_marker_stays_alone() {
        let markers = vec![at("a", 0.0, 0.0), at("bad", 1.0, 0.0), at("b", 2.0, 0.0)];
        let groups = group_by_proximity(markers, 40.0, |m| {
            if m.id.as_str() == "bad" {
                None
            } else {
                flat(m)
            }
        });
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[0]), vec!["a", "b"]);
        assert_eq!(ids(&groups[1]), vec!["bad"]);
    }

    #[test]
    fn test_units_from_groups_conserves_markers() {
        let markers = vec![
            at("a", 0.0, 0.0),
            at("b", 3.0, 4.0),
            at("c", 100.0, 100.0),
            at("d", 102.0, 101.0),
            at("e", 500.0, 0.0),
        ];
        let units = units_from_groups(group_by_proximity(markers, 40.0, flat));
        assert_eq!(units.len(), 3);
        let total: usize = units.iter().map(DisplayUnit::marker_count).sum();
        assert_eq!(total, 5);
        assert!(matches!(units[0], DisplayUnit::Cluster(_)));
        assert!(matches!(units[2], DisplayUnit::Marker(_)));
    }

    #[test]
    fn test_cluster_centroid_and_label() {
        let cluster =
            Cluster::from_members(vec![at("a", 0.0, 10.0), at("b", 4.0, 20.0)]).unwrap();
        assert!((cluster.coordinate.latitude - 15.0).abs() < 1e-9);
        assert!((cluster.coordinate.longitude - 2.0).abs() < 1e-9);
        assert_eq!(cluster.label(), "2");
        assert_eq!(cluster.id, AnnotationId::cluster_of(&"a".into()));
    }

    #[test]
    fn test_cluster_from_empty_group() {
        assert!(Cluster::from_members(Vec::new()).is_none());
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_cluster_callout_lists_members() {
        let cluster = Cluster::from_members(vec![
            at("a", 0.0, 0.0).with_subtitle("DnD · TTRPG"),
            Marker::new("b", Coordinate::new(0.0, 1.0), ""),
        ])
        .unwrap();
        match cluster.callout() {
            CalloutContent::ClusterList {
                heading,
                entries,
                zoom_action,
            } => {
                assert_eq!(heading, "2 Locations");
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].subtitle.as_deref(), Some("DnD · TTRPG"));
                assert_eq!(entries[1].title, "Location");
                assert_eq!(entries[1].action, CalloutAction::View("b".into()));
                let cluster_id = AnnotationId::cluster_of(&"a".into());
                assert_eq!(zoom_action, CalloutAction::ZoomToFit(cluster_id));
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_find_marker_inside_cluster() {
        let unit = DisplayUnit::Cluster(
            Cluster::from_members(vec![at("a", 0.0, 0.0), at("b", 1.0, 0.0)]).unwrap(),
        );
        assert!(unit.find_marker(&"b".into()).is_some());
        assert!(unit.find_marker(&"z".into()).is_none());
        assert_eq!(unit.display_priority(), CLUSTER_DISPLAY_PRIORITY);
    }
}
