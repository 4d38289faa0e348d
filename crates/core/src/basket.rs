//! Market-basket association rules over invoice item sets.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// One directional association rule between two items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasketRule {
    pub antecedent: String,
    pub consequent: String,
    /// Share of invoices containing both items, in percent.
    pub support_pct: f64,
    /// Share of antecedent invoices that also contain the consequent, in percent.
    pub confidence_pct: f64,
    /// Observed co-occurrence over the co-occurrence expected if independent.
    pub lift: f64,
    /// Number of invoices containing both items.
    pub pair_count: i64,
}

/// Mine directional rules from raw invoice item lists.
///
/// Items are deduplicated within each invoice before counting. Pairs seen in
/// fewer than `max(2, 1% of invoices)` invoices are discarded; each surviving
/// pair yields both directions. Output is sorted by pair count descending,
/// then lexically, so runs over the same ledger are reproducible.
pub fn mine_rules(invoices: &[Vec<String>]) -> Vec<BasketRule> {
    let total = invoices.len();
    if total == 0 {
        return Vec::new();
    }

    let mut item_counts: HashMap<&str, i64> = HashMap::new();
    let mut pair_counts: HashMap<(&str, &str), i64> = HashMap::new();

    for invoice in invoices {
        let items: BTreeSet<&str> = invoice.iter().map(String::as_str).collect();
        for item in &items {
            *item_counts.entry(item).or_insert(0) += 1;
        }
        // BTreeSet iteration is ordered, so (a, b) with a < b is canonical.
        let ordered: Vec<&str> = items.into_iter().collect();
        for (index, a) in ordered.iter().enumerate() {
            for b in &ordered[index + 1..] {
                *pair_counts.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    let min_support = (total as i64 / 100).max(2);
    let total_f = total as f64;

    let mut rules = Vec::new();
    for ((a, b), pair_count) in pair_counts {
        if pair_count < min_support {
            continue;
        }

        let count_a = item_counts[a];
        let count_b = item_counts[b];
        let support = pair_count as f64 / total_f;
        // P(pair) / (P(a) * P(b)); identical for both directions.
        let lift = support / ((count_a as f64 / total_f) * (count_b as f64 / total_f));

        rules.push(BasketRule {
            antecedent: a.to_string(),
            consequent: b.to_string(),
            support_pct: support * 100.0,
            confidence_pct: pair_count as f64 / count_a as f64 * 100.0,
            lift,
            pair_count,
        });
        rules.push(BasketRule {
            antecedent: b.to_string(),
            consequent: a.to_string(),
            support_pct: support * 100.0,
            confidence_pct: pair_count as f64 / count_b as f64 * 100.0,
            lift,
            pair_count,
        });
    }

    rules.sort_by(|x, y| {
        y.pair_count
            .cmp(&x.pair_count)
            .then_with(|| x.antecedent.cmp(&y.antecedent))
            .then_with(|| x.consequent.cmp(&y.consequent))
    });
    rules
}

#[cfg(test)]
mod tests {
    use super::mine_rules;

    fn basket(items: &[&str]) -> Vec<String> {
        items.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn pair_metrics_match_hand_computation() {
        // 100 invoices: X+Y together in 3, X alone in 7 more, Y alone in 17
        // more, the rest carry unrelated singles.
        let mut invoices = Vec::new();
        for _ in 0..3 {
            invoices.push(basket(&["X", "Y"]));
        }
        for _ in 0..7 {
            invoices.push(basket(&["X"]));
        }
        for _ in 0..17 {
            invoices.push(basket(&["Y"]));
        }
        for _ in 0..73 {
            invoices.push(basket(&["filler"]));
        }

        let rules = mine_rules(&invoices);
        let x_to_y = rules
            .iter()
            .find(|r| r.antecedent == "X" && r.consequent == "Y")
            .expect("X->Y survives the support floor");

        assert_eq!(x_to_y.pair_count, 3);
        assert!((x_to_y.support_pct - 3.0).abs() < 1e-9);
        assert!((x_to_y.confidence_pct - 30.0).abs() < 1e-9);
        // lift = 0.03 / (0.10 * 0.20) = 1.5
        assert!((x_to_y.lift - 1.5).abs() < 1e-9);

        let y_to_x = rules
            .iter()
            .find(|r| r.antecedent == "Y" && r.consequent == "X")
            .expect("reverse direction is emitted");
        assert!((y_to_x.confidence_pct - 15.0).abs() < 1e-9);
        assert!((y_to_x.lift - 1.5).abs() < 1e-9);
    }

    #[test]
    fn support_floor_is_at_least_two() {
        // 10 invoices: 1% floors to 0, so the minimum of 2 applies.
        let mut invoices = vec![basket(&["A", "B"])];
        for _ in 0..9 {
            invoices.push(basket(&["C"]));
        }

        assert!(mine_rules(&invoices).is_empty());

        invoices.push(basket(&["A", "B"]));
        let rules = mine_rules(&invoices);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn one_percent_floor_applies_on_large_ledgers() {
        // 300 invoices: floor is 3, a pair seen twice is dropped.
        let mut invoices = vec![basket(&["A", "B"]), basket(&["A", "B"])];
        for _ in 0..298 {
            invoices.push(basket(&["filler"]));
        }
        assert!(mine_rules(&invoices).is_empty());

        invoices.push(basket(&["A", "B"]));
        assert_eq!(mine_rules(&invoices).len(), 2);
    }

    #[test]
    fn duplicate_lines_within_an_invoice_count_once() {
        let invoices = vec![
            basket(&["A", "A", "B"]),
            basket(&["A", "B", "B"]),
            basket(&["A", "B"]),
        ];

        let rules = mine_rules(&invoices);
        let a_to_b = rules.iter().find(|r| r.antecedent == "A").unwrap();

        assert_eq!(a_to_b.pair_count, 3);
        assert!((a_to_b.confidence_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_ledger_yields_no_rules() {
        assert!(mine_rules(&[]).is_empty());
    }

    #[test]
    fn output_order_is_deterministic() {
        let mut invoices = Vec::new();
        for _ in 0..5 {
            invoices.push(basket(&["A", "B"]));
        }
        for _ in 0..3 {
            invoices.push(basket(&["C", "D"]));
        }

        let rules = mine_rules(&invoices);
        let pairs: Vec<(&str, &str)> =
            rules.iter().map(|r| (r.antecedent.as_str(), r.consequent.as_str())).collect();

        assert_eq!(pairs, vec![("A", "B"), ("B", "A"), ("C", "D"), ("D", "C")]);
    }
}
