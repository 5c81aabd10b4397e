//! Buyer leaderboard

use crate::rewards::{Buyer, BuyerRecord};

/// Number of buyers on the podium
pub const PODIUM_SIZE: usize = 3;

/// A buyer with its 1-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedBuyer {
    pub position: usize,
    pub buyer: Buyer,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ranking {
    pub top: Vec<RankedBuyer>,
    pub rest: Vec<RankedBuyer>,
}

impl Ranking {
    /// An empty ranking is not displayed at all
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.rest.is_empty()
    }
}

/// Rank buyers by `total_numbers`, highest first.
///
/// Malformed entries are dropped. Ties keep their input order: the client
/// has no secondary key to break them with.
pub fn rank(records: &[BuyerRecord]) -> Ranking {
    let mut buyers: Vec<Buyer> = records.iter().filter_map(BuyerRecord::to_buyer).collect();
    // stable
    buyers.sort_by(|a, b| b.total_numbers.cmp(&a.total_numbers));

    let mut ranked = buyers
        .into_iter()
        .enumerate()
        .map(|(index, buyer)| RankedBuyer {
            position: index + 1,
            buyer,
        });

    let top = ranked.by_ref().take(PODIUM_SIZE).collect();
    let rest = ranked.collect();
    Ranking { top, rest }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, total: u64) -> BuyerRecord {
        BuyerRecord {
            user: Some(json!({
                "id": name.to_lowercase(),
                "name": name,
                "email": format!("{}@email.com", name.to_lowercase())
            })),
            total_numbers: Some(json!(total)),
        }
    }

    fn summary(ranked: &[RankedBuyer]) -> Vec<(usize, String, u64)> {
        ranked
            .iter()
            .map(|r| (r.position, r.buyer.user.name.clone(), r.buyer.total_numbers))
            .collect()
    }

    #[test]
    fn ties_keep_input_order() {
        let ranking = rank(&[
            record("A", 10),
            record("B", 25),
            record("C", 25),
            record("D", 5),
        ]);

        assert_eq!(
            summary(&ranking.top),
            vec![
                (1, "B".to_string(), 25),
                (2, "C".to_string(), 25),
                (3, "A".to_string(), 10)
            ]
        );
        assert_eq!(summary(&ranking.rest), vec![(4, "D".to_string(), 5)]);
    }

    #[test]
    fn short_lists_fill_only_the_podium() {
        let ranking = rank(&[record("A", 1), record("B", 2)]);
        assert_eq!(ranking.top.len(), 2);
        assert!(ranking.rest.is_empty());
        assert_eq!(ranking.top[0].buyer.user.name, "B");
    }

    #[test]
    fn invalid_entries_are_dropped_not_defaulted() {
        let ranking = rank(&[
            BuyerRecord {
                user: None,
                total_numbers: Some(json!(50)),
            },
            record("A", 3),
            BuyerRecord {
                user: record("B", 0).user,
                total_numbers: Some(json!("muitos")),
            },
            BuyerRecord {
                user: record("C", 0).user,
                total_numbers: None,
            },
        ]);

        assert_eq!(summary(&ranking.top), vec![(1, "A".to_string(), 3)]);
        assert!(ranking.rest.is_empty());
    }

    #[test]
    fn empty_or_all_invalid_input_is_not_rendered() {
        assert!(rank(&[]).is_empty());
        assert!(rank(&[BuyerRecord::default(), BuyerRecord::default()]).is_empty());
    }
}
