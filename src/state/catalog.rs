//! Configured set of world cups a user can play or vote in.

use indexmap::IndexMap;
use tracing::warn;

use crate::state::bracket::Contestant;

/// A named field of contestants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldCup {
    pub id: String,
    pub title: String,
    pub contestants: Vec<Contestant>,
}

impl WorldCup {
    /// Contestant of this cup with the given name.
    pub fn contestant(&self, name: &str) -> Option<&Contestant> {
        self.contestants
            .iter()
            .find(|contestant| contestant.name == name)
    }
}

/// World cups keyed by identifier, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cups: IndexMap<String, WorldCup>,
}

impl Catalog {
    /// Build the catalog, skipping cups that cannot form a bracket and duplicate identifiers.
    pub fn new(cups: impl IntoIterator<Item = WorldCup>) -> Self {
        let mut catalog = IndexMap::new();
        for cup in cups {
            if cup.contestants.len() < 2 {
                warn!(
                    cup_id = %cup.id,
                    count = cup.contestants.len(),
                    "skipping world cup with fewer than two contestants"
                );
                continue;
            }
            if catalog.contains_key(&cup.id) {
                warn!(cup_id = %cup.id, "skipping duplicate world cup identifier");
                continue;
            }
            catalog.insert(cup.id.clone(), cup);
        }
        Self { cups: catalog }
    }

    pub fn get(&self, cup_id: &str) -> Option<&WorldCup> {
        self.cups.get(cup_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldCup> {
        self.cups.values()
    }

    pub fn len(&self) -> usize {
        self.cups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cup(id: &str, names: &[&str]) -> WorldCup {
        WorldCup {
            id: id.into(),
            title: format!("{id} cup"),
            contestants: names
                .iter()
                .map(|name| Contestant {
                    name: (*name).into(),
                    media_ref: format!("{name}-video"),
                    thumbnail_ref: format!("{name}.jpg"),
                })
                .collect(),
        }
    }

    #[test]
    fn skips_degenerate_and_duplicate_cups() {
        let catalog = Catalog::new([
            cup("bts", &["Dynamite", "Butter"]),
            cup("solo", &["Only"]),
            cup("bts", &["Spring Day", "DNA"]),
            cup("twice", &["TT", "FANCY", "LIKEY"]),
        ]);

        let ids = catalog.iter().map(|cup| cup.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["bts", "twice"]);
        assert_eq!(
            catalog.get("bts").and_then(|cup| cup.contestant("Butter")).map(|c| c.media_ref.as_str()),
            Some("Butter-video")
        );
        assert!(catalog.get("solo").is_none());
    }
}
