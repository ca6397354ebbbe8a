//! Breadth-first search for the shortest chain of shared works between two
//! people.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::graph_store::{EntityId, GraphStore, WorkId};

/// One step of a path: `entity` was reached through `work`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hop {
    pub work: WorkId,
    pub entity: EntityId,
}

impl Hop {
    pub fn new(work: impl Into<WorkId>, entity: impl Into<EntityId>) -> Self {
        Self {
            work: work.into(),
            entity: entity.into(),
        }
    }
}

/// Outcome of [`shortest_path`]. Not being connected is an ordinary answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    /// Hops in source-to-target order. Empty when source and target coincide.
    Path(Vec<Hop>),
    NotConnected,
}

impl Connection {
    pub fn hops(&self) -> Option<&[Hop]> {
        match self {
            Connection::Path(hops) => Some(hops),
            Connection::NotConnected => None,
        }
    }

    /// Number of hops, or `None` when not connected.
    pub fn degrees(&self) -> Option<usize> {
        self.hops().map(<[Hop]>::len)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Connection::Path(_))
    }
}

type CameFrom<'a> = HashMap<&'a EntityId, (&'a WorkId, &'a EntityId)>;

/// Finds a path with the fewest hops from `source` to `target`.
///
/// The frontier is a strict FIFO queue, so the first time `target` is
/// discovered it is at minimal depth. Among several shortest paths the one
/// returned follows the store's neighbor order: lowest work id, then lowest
/// entity id, at every layer.
///
/// # Panics
///
/// Panics if either id is not in the store. Ids are expected to come from
/// [`GraphStore::resolve`].
pub fn shortest_path(store: &GraphStore, source: &EntityId, target: &EntityId) -> Connection {
    assert!(store.contains_entity(source), "unknown source entity id '{source}'");
    assert!(store.contains_entity(target), "unknown target entity id '{target}'");

    if source == target {
        return Connection::Path(Vec::new());
    }

    let mut frontier: VecDeque<&EntityId> = VecDeque::from([source]);
    // source is visited up front so a self-pairing can never loop back to it
    let mut visited: HashSet<&EntityId> = HashSet::from([source]);
    let mut came_from: CameFrom<'_> = HashMap::new();
    let mut expanded = 0usize;

    while let Some(person) = frontier.pop_front() {
        expanded += 1;
        for (work, neighbor) in store.neighbors(person) {
            if !visited.insert(neighbor) {
                continue;
            }
            came_from.insert(neighbor, (work, person));
            if neighbor == target {
                let hops = backtrack(&came_from, source, target);
                trace!(%source, %target, expanded, degrees = hops.len(), "path found");
                return Connection::Path(hops);
            }
            frontier.push_back(neighbor);
        }
    }

    trace!(%source, %target, expanded, "not connected");
    Connection::NotConnected
}

/// Walks parent pointers from `target` back to `source`.
fn backtrack<'a>(came_from: &CameFrom<'a>, source: &EntityId, target: &'a EntityId) -> Vec<Hop> {
    let mut hops = Vec::new();
    let mut current = target;
    while current != source {
        let Some(&(work, previous)) = came_from.get(current) else {
            break;
        };
        hops.push(Hop {
            work: work.clone(),
            entity: current.clone(),
        });
        current = previous;
    }
    hops.reverse();
    hops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_cleaning::{AppearanceRecord, EntityRecord, WorkRecord};
    use crate::graph_store::tests::{chain_store, movie, person, star};
    use proptest::prelude::*;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    /// Checks that every hop moves along a work shared with the previous person.
    fn assert_valid_path(store: &GraphStore, source: &EntityId, hops: &[Hop]) {
        let mut previous = source;
        for hop in hops {
            let work = store.work(&hop.work).expect("hop names a known work");
            assert!(work.participants.contains(previous));
            assert!(work.participants.contains(&hop.entity));
            previous = &hop.entity;
        }
    }

    #[test]
    fn test_two_hops() {
        let store = chain_store();

        let connection = shortest_path(&store, &id("A"), &id("C"));
        assert_eq!(
            connection,
            Connection::Path(vec![Hop::new("W1", "B"), Hop::new("W2", "C")])
        );
        assert_eq!(connection.degrees(), Some(2));
    }

    #[test]
    fn test_one_hop() {
        let store = chain_store();

        assert_eq!(
            shortest_path(&store, &id("A"), &id("B")),
            Connection::Path(vec![Hop::new("W1", "B")])
        );
    }

    #[test]
    fn test_same_person_is_zero_hops() {
        let store = chain_store();

        for entity in store.entity_ids() {
            assert_eq!(shortest_path(&store, entity, entity), Connection::Path(Vec::new()));
        }
    }

    #[test]
    fn test_person_without_works_is_not_connected() {
        let store = chain_store();

        let connection = shortest_path(&store, &id("A"), &id("D"));
        assert_eq!(connection, Connection::NotConnected);
        assert!(!connection.is_connected());
        assert_eq!(connection.degrees(), None);
        assert_eq!(shortest_path(&store, &id("D"), &id("A")), Connection::NotConnected);
    }

    #[test]
    fn test_disconnected_components() {
        let store = GraphStore::load(
            vec![person("A", "a"), person("B", "b"), person("X", "x"), person("Y", "y")],
            vec![movie("W1", "left"), movie("W9", "right")],
            vec![star("A", "W1"), star("B", "W1"), star("X", "W9"), star("Y", "W9")],
        )
        .unwrap();

        for left in ["A", "B"] {
            for right in ["X", "Y"] {
                assert_eq!(shortest_path(&store, &id(left), &id(right)), Connection::NotConnected);
                assert_eq!(shortest_path(&store, &id(right), &id(left)), Connection::NotConnected);
            }
        }
    }

    #[test]
    fn test_prefers_shorter_path_over_earlier_discovery() {
        // A-B-C-D-T through W1..W4, plus a direct shortcut A-T through W9.
        let store = GraphStore::load(
            ["A", "B", "C", "D", "T"].map(|p| person(p, p)),
            ["W1", "W2", "W3", "W4", "W9"].map(|w| movie(w, w)),
            [
                star("A", "W1"),
                star("B", "W1"),
                star("B", "W2"),
                star("C", "W2"),
                star("C", "W3"),
                star("D", "W3"),
                star("D", "W4"),
                star("T", "W4"),
                star("A", "W9"),
                star("T", "W9"),
            ],
        )
        .unwrap();

        assert_eq!(
            shortest_path(&store, &id("A"), &id("T")),
            Connection::Path(vec![Hop::new("W9", "T")])
        );
    }

    #[test]
    fn test_shared_endpoint_backtracks_correctly() {
        // Two explored edges lead into M (from B and from C); only the parent
        // recorded first may be used when walking back from T.
        let store = GraphStore::load(
            ["A", "B", "C", "M", "T"].map(|p| person(p, p)),
            ["W1", "W2", "W3", "W4", "W5"].map(|w| movie(w, w)),
            [
                star("A", "W1"),
                star("B", "W1"),
                star("A", "W2"),
                star("C", "W2"),
                star("B", "W3"),
                star("M", "W3"),
                star("C", "W4"),
                star("M", "W4"),
                star("M", "W5"),
                star("T", "W5"),
            ],
        )
        .unwrap();

        let connection = shortest_path(&store, &id("A"), &id("T"));
        assert_eq!(
            connection,
            Connection::Path(vec![Hop::new("W1", "B"), Hop::new("W3", "M"), Hop::new("W5", "T")])
        );
        assert_valid_path(&store, &id("A"), connection.hops().unwrap());
    }

    #[test]
    fn test_tie_break_follows_lowest_ids() {
        // A reaches T through B (via W2) or through C (via W1); W1 sorts first.
        let store = GraphStore::load(
            ["A", "B", "C", "T"].map(|p| person(p, p)),
            ["W1", "W2", "W3", "W4"].map(|w| movie(w, w)),
            [
                star("A", "W2"),
                star("B", "W2"),
                star("A", "W1"),
                star("C", "W1"),
                star("B", "W3"),
                star("T", "W3"),
                star("C", "W4"),
                star("T", "W4"),
            ],
        )
        .unwrap();

        assert_eq!(
            shortest_path(&store, &id("A"), &id("T")),
            Connection::Path(vec![Hop::new("W1", "C"), Hop::new("W4", "T")])
        );
    }

    #[test]
    fn test_idempotent() {
        let store = chain_store();

        let first = shortest_path(&store, &id("C"), &id("A"));
        let second = shortest_path(&store, &id("C"), &id("A"));
        assert_eq!(first, second);
    }

    fn all_pairs(store: &GraphStore, ids: &[&EntityId]) -> Vec<Connection> {
        let mut results = Vec::new();
        for source in ids {
            for target in ids {
                results.push(shortest_path(store, source, target));
            }
        }
        results
    }

    #[test]
    fn test_concurrent_searches_share_store() {
        let store = chain_store();
        let ids: Vec<&EntityId> = store.entity_ids().into_iter().collect();
        let sequential = all_pairs(&store, &ids);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| all_pairs(&store, &ids)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), sequential);
            }
        });
    }

    #[test]
    #[should_panic(expected = "unknown source entity id 'ghost'")]
    fn test_unknown_source_panics() {
        let store = chain_store();
        shortest_path(&store, &id("ghost"), &id("A"));
    }

    #[test]
    #[should_panic(expected = "unknown target entity id 'ghost'")]
    fn test_unknown_target_panics() {
        let store = chain_store();
        shortest_path(&store, &id("A"), &id("ghost"));
    }

    const MAX_PEOPLE: usize = 8;

    /// Builds a store from a membership matrix: `casts[w][p]` puts person `p` in work `w`.
    fn matrix_store(people: usize, casts: &[Vec<bool>]) -> GraphStore {
        let entities: Vec<EntityRecord> = (0..people).map(|p| person(&format!("p{p}"), "n")).collect();
        let works: Vec<WorkRecord> = (0..casts.len()).map(|w| movie(&format!("w{w}"), "t")).collect();
        let appearances: Vec<AppearanceRecord> = casts
            .iter()
            .enumerate()
            .flat_map(|(w, cast)| {
                cast.iter()
                    .take(people)
                    .enumerate()
                    .filter(|(_, in_cast)| **in_cast)
                    .map(move |(p, _)| star(&format!("p{p}"), &format!("w{w}")))
            })
            .collect();
        GraphStore::load(entities, works, appearances).unwrap()
    }

    /// All-pairs hop distances by Floyd-Warshall over the projected person graph.
    fn oracle(people: usize, casts: &[Vec<bool>]) -> Vec<Vec<Option<usize>>> {
        let mut dist = vec![vec![None; people]; people];
        for (p, row) in dist.iter_mut().enumerate() {
            row[p] = Some(0);
        }
        for cast in casts {
            for a in 0..people {
                for b in 0..people {
                    if a != b && cast[a] && cast[b] {
                        dist[a][b] = Some(1);
                    }
                }
            }
        }
        for k in 0..people {
            for i in 0..people {
                for j in 0..people {
                    if let (Some(ik), Some(kj)) = (dist[i][k], dist[k][j]) {
                        if dist[i][j].map_or(true, |ij| ik + kj < ij) {
                            dist[i][j] = Some(ik + kj);
                        }
                    }
                }
            }
        }
        dist
    }

    fn graph() -> impl Strategy<Value = (usize, Vec<Vec<bool>>)> {
        (
            1..=MAX_PEOPLE,
            proptest::collection::vec(proptest::collection::vec(any::<bool>(), MAX_PEOPLE), 0..6),
        )
    }

    proptest! {
        #[test]
        fn prop_matches_oracle_distance((people, casts) in graph()) {
            let store = matrix_store(people, &casts);
            let dist = oracle(people, &casts);

            for a in 0..people {
                for b in 0..people {
                    let source = id(&format!("p{a}"));
                    let target = id(&format!("p{b}"));
                    let connection = shortest_path(&store, &source, &target);
                    prop_assert_eq!(connection.degrees(), dist[a][b]);
                    if let Some(hops) = connection.hops() {
                        assert_valid_path(&store, &source, hops);
                        if let Some(last) = hops.last() {
                            prop_assert_eq!(&last.entity, &target);
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_length_is_symmetric((people, casts) in graph()) {
            let store = matrix_store(people, &casts);

            for a in 0..people {
                for b in 0..people {
                    let source = id(&format!("p{a}"));
                    let target = id(&format!("p{b}"));
                    prop_assert_eq!(
                        shortest_path(&store, &source, &target).degrees(),
                        shortest_path(&store, &target, &source).degrees()
                    );
                }
            }
        }
    }
}
