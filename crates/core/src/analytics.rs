//! Product analytics: ABC revenue concentration, XYZ demand variability,
//! turnover and GMROI.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cumulative-revenue share within which an item is an A item.
const ABC_A_CUTOFF: f64 = 0.80;
/// Items whose revenue mass starts at or below this share are at worst B.
const ABC_B_CUTOFF: f64 = 0.95;
/// Coefficient-of-variation bound for steady (X) demand.
const XYZ_X_CUTOFF: f64 = 0.5;
/// Coefficient-of-variation bound for fluctuating (Y) demand.
const XYZ_Y_CUTOFF: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum XyzClass {
    X,
    Y,
    Z,
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AbcClass::A => "A",
            AbcClass::B => "B",
            AbcClass::C => "C",
        })
    }
}

impl FromStr for AbcClass {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "A" => Ok(AbcClass::A),
            "B" => Ok(AbcClass::B),
            "C" => Ok(AbcClass::C),
            other => Err(format!("unknown ABC class `{other}`")),
        }
    }
}

impl fmt::Display for XyzClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            XyzClass::X => "X",
            XyzClass::Y => "Y",
            XyzClass::Z => "Z",
        })
    }
}

impl FromStr for XyzClass {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "X" => Ok(XyzClass::X),
            "Y" => Ok(XyzClass::Y),
            "Z" => Ok(XyzClass::Z),
            other => Err(format!("unknown XYZ class `{other}`")),
        }
    }
}

/// Sales aggregates for one item over the trailing twelve months, as read
/// from the ledger.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSales {
    pub item_id: String,
    /// Sum of line net amounts.
    pub revenue: Decimal,
    /// Valuation rate times quantity sold (approximate COGS).
    pub cogs: Decimal,
    pub quantity: f64,
    pub invoice_count: i64,
    /// Quantity sold per calendar month, slot 0 = current month, zero-filled.
    pub monthly_quantities: [f64; 12],
    /// Valuation rate times stock on hand.
    pub inventory_value: Decimal,
}

/// Full analytics profile for one item.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemProfile {
    pub item_id: String,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub quantity: f64,
    pub invoice_count: i64,
    pub abc: AbcClass,
    pub xyz: XyzClass,
    pub coefficient_of_variation: f64,
    pub turnover_ratio: f64,
    pub gmroi: f64,
}

/// Profile every item: ABC against the whole set, XYZ/turnover/GMROI per item.
///
/// Output is ordered by revenue descending (the ABC ranking order).
pub fn profile_items(mut sales: Vec<ItemSales>) -> Vec<ItemProfile> {
    sales.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    let total_revenue: f64 =
        sales.iter().map(|s| s.revenue.to_f64().unwrap_or(0.0)).filter(|r| *r > 0.0).sum();

    let mut cumulative = 0.0;
    let mut profiles = Vec::with_capacity(sales.len());

    for item in sales {
        let share = if total_revenue > 0.0 {
            item.revenue.to_f64().unwrap_or(0.0).max(0.0) / total_revenue
        } else {
            0.0
        };
        let before = cumulative;
        cumulative += share;

        let abc = if total_revenue <= 0.0 {
            AbcClass::C
        } else {
            classify_abc(before, cumulative)
        };

        let (cv, xyz) = classify_xyz(&item.monthly_quantities);

        let inventory_value = item.inventory_value.to_f64().unwrap_or(0.0);
        let cogs = item.cogs.to_f64().unwrap_or(0.0);
        let profit = item.revenue - item.cogs;
        let (turnover_ratio, gmroi) = if inventory_value > 0.0 {
            (cogs / inventory_value, profit.to_f64().unwrap_or(0.0) / inventory_value)
        } else {
            (0.0, 0.0)
        };

        profiles.push(ItemProfile {
            item_id: item.item_id,
            revenue: item.revenue,
            profit,
            quantity: item.quantity,
            invoice_count: item.invoice_count,
            abc,
            xyz,
            coefficient_of_variation: cv,
            turnover_ratio,
            gmroi,
        });
    }

    profiles
}

/// Classify one item from where its revenue mass sits in the ranking.
///
/// An item is A while the cumulative share through it stays within the A
/// cutoff; it is C only when better-ranked items already exceed the B cutoff
/// before it (the item lies wholly in the tail). Items straddling a boundary
/// take the better class.
fn classify_abc(cumulative_before: f64, cumulative_through: f64) -> AbcClass {
    if cumulative_through <= ABC_A_CUTOFF {
        AbcClass::A
    } else if cumulative_before <= ABC_B_CUTOFF {
        AbcClass::B
    } else {
        AbcClass::C
    }
}

/// Coefficient of variation of the monthly demand vector, and the class it
/// implies. A zero mean forces Z: an item with no measurable steady demand
/// cannot be called predictable.
fn classify_xyz(monthly: &[f64; 12]) -> (f64, XyzClass) {
    let mean = monthly.iter().sum::<f64>() / monthly.len() as f64;
    if mean == 0.0 {
        return (0.0, XyzClass::Z);
    }

    let variance =
        monthly.iter().map(|q| (q - mean) * (q - mean)).sum::<f64>() / monthly.len() as f64;
    let cv = variance.sqrt() / mean;

    let class = if cv < XYZ_X_CUTOFF {
        XyzClass::X
    } else if cv <= XYZ_Y_CUTOFF {
        XyzClass::Y
    } else {
        XyzClass::Z
    };
    (cv, class)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{profile_items, AbcClass, ItemSales, XyzClass};

    fn item(id: &str, revenue: i64) -> ItemSales {
        ItemSales {
            item_id: id.to_string(),
            revenue: Decimal::new(revenue, 0),
            cogs: Decimal::new(revenue / 2, 0),
            quantity: 10.0,
            invoice_count: 5,
            monthly_quantities: [1.0; 12],
            inventory_value: Decimal::new(100, 0),
        }
    }

    #[test]
    fn abc_classification_follows_cumulative_revenue_shares() {
        // Shares 40/35/13/9/3 percent: cumulative 40, 75, 88, 97, 100.
        let sales = vec![
            item("i1", 4000),
            item("i2", 3500),
            item("i3", 1300),
            item("i4", 900),
            item("i5", 300),
        ];

        let profiles = profile_items(sales);
        let classes: Vec<AbcClass> = profiles.iter().map(|p| p.abc).collect();

        assert_eq!(
            classes,
            vec![AbcClass::A, AbcClass::A, AbcClass::B, AbcClass::B, AbcClass::C]
        );
    }

    #[test]
    fn single_item_takes_all_revenue_as_a() {
        let profiles = profile_items(vec![item("only", 500)]);
        assert_eq!(profiles[0].abc, AbcClass::A);
    }

    #[test]
    fn zero_total_revenue_forces_c() {
        let profiles = profile_items(vec![item("dud", 0)]);
        assert_eq!(profiles[0].abc, AbcClass::C);
    }

    #[test]
    fn output_is_ordered_by_revenue_descending() {
        let profiles = profile_items(vec![item("small", 100), item("big", 9000)]);
        assert_eq!(profiles[0].item_id, "big");
        assert_eq!(profiles[1].item_id, "small");
    }

    #[test]
    fn steady_demand_classifies_x() {
        let mut sales = item("steady", 1000);
        sales.monthly_quantities = [10.0; 12];

        let profile = profile_items(vec![sales]).remove(0);

        assert_eq!(profile.xyz, XyzClass::X);
        assert_eq!(profile.coefficient_of_variation, 0.0);
    }

    #[test]
    fn erratic_demand_classifies_z() {
        let mut sales = item("spiky", 1000);
        sales.monthly_quantities = [0.0; 12];
        sales.monthly_quantities[0] = 120.0;

        let profile = profile_items(vec![sales]).remove(0);

        // One spike in twelve months: cv = sqrt(11) ~ 3.3.
        assert_eq!(profile.xyz, XyzClass::Z);
        assert!(profile.coefficient_of_variation > 3.0);
    }

    #[test]
    fn moderate_variation_classifies_y() {
        let mut sales = item("seasonal", 1000);
        sales.monthly_quantities =
            [20.0, 5.0, 20.0, 5.0, 20.0, 5.0, 20.0, 5.0, 20.0, 5.0, 20.0, 5.0];

        let profile = profile_items(vec![sales]).remove(0);

        // Mean 12.5, std 7.5, cv 0.6.
        assert_eq!(profile.xyz, XyzClass::Y);
        assert!((profile.coefficient_of_variation - 0.6).abs() < 1e-9);
    }

    #[test]
    fn no_sales_in_any_month_forces_z_with_zero_cv() {
        let mut sales = item("dormant", 1000);
        sales.monthly_quantities = [0.0; 12];

        let profile = profile_items(vec![sales]).remove(0);

        assert_eq!(profile.xyz, XyzClass::Z);
        assert_eq!(profile.coefficient_of_variation, 0.0);
    }

    #[test]
    fn turnover_and_gmroi_derive_from_inventory_value() {
        let mut sales = item("stocked", 1000); // cogs 500, profit 500
        sales.inventory_value = Decimal::new(250, 0);

        let profile = profile_items(vec![sales]).remove(0);

        assert!((profile.turnover_ratio - 2.0).abs() < 1e-9);
        assert!((profile.gmroi - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_inventory_value_yields_zero_ratios() {
        let mut sales = item("stockless", 1000);
        sales.inventory_value = Decimal::ZERO;

        let profile = profile_items(vec![sales]).remove(0);

        assert_eq!(profile.turnover_ratio, 0.0);
        assert_eq!(profile.gmroi, 0.0);
    }

    #[test]
    fn profit_is_revenue_minus_cogs() {
        let profile = profile_items(vec![item("margin", 1000)]).remove(0);
        assert_eq!(profile.profit, Decimal::new(500, 0));
    }
}
