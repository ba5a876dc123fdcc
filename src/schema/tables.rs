use super::columns::ENTITY_KEYS;
use super::kind::EntityKind;
use super::params::Params;
use super::table::{Table, Tables};
use crate::error::ComposeError;

use Table::*;

/// The single base table of `kind`.
pub fn primary_table(kind: EntityKind) -> (Table, &'static str) {
    let table = match kind {
        EntityKind::Ad => Banners,
        EntityKind::Advertiser => Clients,
        EntityKind::AdCategoryAssoc => AdCategoryAssoc,
        EntityKind::AdZoneAssoc => AdZoneAssoc,
        EntityKind::Agency => Agency,
        EntityKind::Category => Category,
        EntityKind::Channel => Channel,
        EntityKind::ChannelLimitation => AclsChannel,
        EntityKind::Image => Images,
        EntityKind::Limitation => Acls,
        EntityKind::Placement => Campaigns,
        EntityKind::PlacementTracker => CampaignsTrackers,
        EntityKind::PlacementZoneAssoc => PlacementZoneAssoc,
        EntityKind::Publisher => Affiliates,
        EntityKind::Stats
        | EntityKind::StatsByEntity
        | EntityKind::HistorySpan
        | EntityKind::HistoryDay
        | EntityKind::HistoryMonth
        | EntityKind::HistoryDow
        | EntityKind::HistoryHour => DataSummaryAdHourly,
        EntityKind::Tracker => Trackers,
        EntityKind::Variable => Variables,
        EntityKind::Zone => Zones,
    };
    (table, table.alias())
}

/// Rollup table named by `custom_table`, defaulting to the hourly summary.
pub fn rollup_table(params: &Params) -> Result<Table, ComposeError> {
    match params.scalar("custom_table") {
        None => Ok(DataSummaryAdHourly),
        Some(name) => match name.parse::<Table>()? {
            t @ (DataSummaryAdHourly | DataIntermediateAdConnection | DataSummaryAdArrivalHourly) => {
                Ok(t)
            }
            _ => Err(ComposeError::UnknownTable(name.to_string())),
        },
    }
}

const AD_FILTERS: &[&str] = &["ad_width", "ad_height", "ad_type", "ad_active"];
const PLACEMENT_FILTERS: &[&str] = &["placement_active", "placement_anonymous"];
const ZONE_FILTERS: &[&str] = &["zone_inventory_forecast_type"];

/// Width/height filters apply as soon as the key is present, the others
/// only when they carry a value.
fn wants(params: &Params, key: &str) -> bool {
    match key {
        "ad_width" | "ad_height" => params.is_set(key),
        _ => params.is_filled(key),
    }
}

fn any_wanted(params: &Params, keys: &[&str]) -> bool {
    keys.iter().any(|k| wants(params, k))
}

/// Tables required to answer a request for `kind`, base table first.
///
/// Only recognized keys pull tables in. With `include_stats` the rollup
/// table joins in together with whatever its statistics filters reference.
pub fn tables(kind: EntityKind, params: &Params, include_stats: bool) -> Result<Tables, ComposeError> {
    let mut t = Tables::new();
    t.add(primary_table(kind).0);
    let p = params;

    match kind {
        EntityKind::Ad => {
            if p.is_filled("agency_id") {
                t.add_all(&[Clients, Campaigns]);
            }
            if p.is_filled("advertiser_id") || any_wanted(p, PLACEMENT_FILTERS) {
                t.add(Campaigns);
            }
            if include_stats {
                t.add(DataSummaryAdHourly);
            }
        }
        EntityKind::Advertiser => {
            if p.is_filled("placement_id") || any_wanted(p, PLACEMENT_FILTERS) {
                t.add(Campaigns);
            }
            if p.is_filled("ad_id") || any_wanted(p, AD_FILTERS) {
                t.add_all(&[Campaigns, Banners]);
            }
            if include_stats {
                t.add_all(&[DataSummaryAdHourly, Banners, Campaigns]);
            }
        }
        EntityKind::AdCategoryAssoc | EntityKind::Limitation => {
            if p.is_filled("agency_id") {
                t.add_all(&[Banners, Campaigns, Clients]);
            }
            if p.is_filled("advertiser_id") {
                t.add_all(&[Banners, Campaigns]);
            }
            if p.is_filled("placement_id") {
                t.add(Banners);
            }
            if kind == EntityKind::AdCategoryAssoc {
                if any_wanted(p, PLACEMENT_FILTERS) {
                    t.add_all(&[Banners, Campaigns]);
                }
                if any_wanted(p, AD_FILTERS) {
                    t.add(Banners);
                }
            }
        }
        EntityKind::AdZoneAssoc => {
            if p.is_filled("agency_id") {
                t.add_all(&[Zones, Banners, Campaigns, Clients, Affiliates]);
            }
            if p.is_filled("publisher_id") {
                t.add(Zones);
            }
            if p.is_filled("advertiser_id") {
                t.add_all(&[Banners, Campaigns]);
            }
            if p.is_filled("placement_id") {
                t.add(Banners);
            }
            if any_wanted(p, PLACEMENT_FILTERS) {
                t.add_all(&[Banners, Campaigns]);
            }
            if any_wanted(p, ZONE_FILTERS) {
                t.add(Zones);
            }
            if any_wanted(p, AD_FILTERS) {
                t.add(Banners);
            }
        }
        EntityKind::Agency => {
            if p.is_filled("advertiser_id") {
                t.add(Clients);
            }
            if p.is_filled("placement_id") || any_wanted(p, PLACEMENT_FILTERS) {
                t.add_all(&[Clients, Campaigns]);
            }
            if p.is_filled("ad_id") || any_wanted(p, AD_FILTERS) {
                t.add_all(&[Clients, Campaigns, Banners]);
            }
            if p.is_filled("publisher_id") {
                t.add(Affiliates);
            }
            if p.is_filled("zone_id") || any_wanted(p, ZONE_FILTERS) {
                t.add_all(&[Affiliates, Zones]);
            }
            if include_stats {
                t.add_all(&[DataSummaryAdHourly, Banners, Campaigns, Clients, Affiliates, Zones]);
            }
        }
        EntityKind::Category
        | EntityKind::Channel
        | EntityKind::ChannelLimitation
        | EntityKind::Image => {}
        EntityKind::Placement => {
            if p.is_filled("agency_id") {
                t.add(Clients);
            }
            if p.is_filled("ad_id") || any_wanted(p, AD_FILTERS) {
                t.add(Banners);
            }
            if include_stats {
                if p.is_filled("publisher_id") {
                    t.add(Zones);
                }
                t.add_all(&[DataSummaryAdHourly, Banners]);
            }
        }
        EntityKind::PlacementTracker => {
            if p.is_filled("agency_id") {
                t.add_all(&[Campaigns, Clients, Trackers]);
            }
            if p.is_filled("advertiser_id") {
                t.add_all(&[Campaigns, Trackers]);
            }
        }
        EntityKind::PlacementZoneAssoc => {
            if p.is_filled("ad_id") {
                t.add(Banners);
            }
            if p.is_filled("advertiser_id") {
                t.add(Campaigns);
            }
            if p.is_filled("agency_id") {
                t.add_all(&[Zones, Campaigns, Clients, Affiliates]);
            }
            if any_wanted(p, PLACEMENT_FILTERS) {
                t.add(Campaigns);
            }
            if p.is_filled("publisher_id") || any_wanted(p, ZONE_FILTERS) {
                t.add(Zones);
            }
        }
        EntityKind::Publisher => {
            if p.is_filled("zone_id") || any_wanted(p, ZONE_FILTERS) {
                t.add(Zones);
            }
            if include_stats {
                t.add_all(&[DataSummaryAdHourly, Zones]);
                if p.is_filled("placement_id") {
                    t.add(Banners);
                }
            }
        }
        EntityKind::Stats
        | EntityKind::HistorySpan
        | EntityKind::HistoryDay
        | EntityKind::HistoryMonth
        | EntityKind::HistoryDow
        | EntityKind::HistoryHour => {
            return rollup_tables(p, &|key| p.is_filled(key));
        }
        EntityKind::StatsByEntity => {
            // Included keys need the same tables as filtering on them.
            let included = |key: &str| {
                p.is_filled(key)
                    || (ENTITY_KEYS.iter().any(|(n, _)| *n == key) && p.contains_in("include", key))
            };
            return rollup_tables(p, &included);
        }
        EntityKind::Tracker => {
            if p.is_filled("agency_id") {
                t.add(Clients);
            }
            if p.is_filled("ad_id") {
                t.add_all(&[Banners, Campaigns, CampaignsTrackers]);
            }
            if p.is_filled("placement_id") {
                t.add(CampaignsTrackers);
            }
        }
        EntityKind::Variable => {
            if p.is_filled("agency_id") {
                t.add_all(&[Clients, Trackers]);
            }
            if p.is_filled("advertiser_id") {
                t.add(Trackers);
            }
        }
        EntityKind::Zone => {
            if p.is_filled("agency_id") {
                t.add(Affiliates);
            }
            if include_stats {
                t.add(DataSummaryAdHourly);
                if p.is_filled("placement_id") {
                    t.add(Banners);
                }
            }
        }
    }

    if include_stats && kind.stats_key().is_some() {
        add_stats_filter_tables(&mut t, p);
    }
    Ok(t)
}

fn rollup_tables(p: &Params, filled: &dyn Fn(&str) -> bool) -> Result<Tables, ComposeError> {
    let mut t = Tables::new();
    t.add(rollup_table(p)?);
    if filled("agency_id") {
        t.add_all(&[Clients, Campaigns, Banners, Affiliates, Zones]);
    }
    if filled("advertiser_id") || any_wanted(p, PLACEMENT_FILTERS) {
        t.add_all(&[Campaigns, Banners]);
    }
    if filled("placement_id") || any_wanted(p, AD_FILTERS) {
        t.add(Banners);
    }
    if filled("publisher_id") || any_wanted(p, ZONE_FILTERS) {
        t.add(Zones);
    }
    Ok(t)
}

/// Statistics filters on a joined entity reference the publisher's zones,
/// the advertiser's campaigns and the placement's banners.
fn add_stats_filter_tables(t: &mut Tables, p: &Params) {
    if p.is_filled("publisher_id") {
        t.add(Zones);
    }
    if p.is_filled("advertiser_id") {
        t.add_all(&[Campaigns, Banners]);
    }
    if p.is_filled("placement_id") {
        t.add(Banners);
    }
}

/// Tables attached with LEFT JOIN for `kind`, so rows without a zone still
/// show up. Callers defer only the ones that are actually required.
pub fn left_joined_tables(kind: EntityKind, params: &Params) -> Vec<Table> {
    match kind {
        EntityKind::StatsByEntity
            if params.is_set("exclude")
                && params.is_filled("agency_id")
                && params.contains_in("exclude", "zone_id") =>
        {
            vec![Zones, Affiliates]
        }
        k if k.is_history() => vec![Zones, Affiliates],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(kind: EntityKind, params: &Params, include_stats: bool) -> Vec<&'static str> {
        tables(kind, params, include_stats).unwrap().aliases()
    }

    #[test]
    fn test_primary_table_equivalence() {
        for kind in EntityKind::ALL {
            let t = tables(kind, &Params::new(), false).unwrap();
            assert_eq!(t.len(), 1, "{}", kind);
            assert_eq!(t.first(), Some(primary_table(kind)), "{}", kind);
        }
    }

    #[test]
    fn test_placement_filtered_by_advertiser() {
        let params = Params::new().with("advertiser_id", 5);
        assert_eq!(aliases(EntityKind::Placement, &params, false), vec!["m"]);
    }

    #[test]
    fn test_zone_filtered_by_agency() {
        let params = Params::new().with("agency_id", 3);
        assert_eq!(aliases(EntityKind::Zone, &params, false), vec!["z", "p"]);
    }

    #[test]
    fn test_presence_versus_value() {
        // Width filters trigger on presence, id filters need a value.
        let width = Params::new().with("ad_width", "0");
        assert_eq!(aliases(EntityKind::Placement, &width, false), vec!["m", "d"]);
        let zero_ad = Params::new().with("ad_id", "0");
        assert_eq!(aliases(EntityKind::Placement, &zero_ad, false), vec!["m"]);
    }

    #[test]
    fn test_unrelated_params_do_not_change_tables() {
        let noise = Params::new()
            .with("unrelated", "7")
            .with("order_by", "name")
            .with("limit", 10);
        for kind in EntityKind::ALL {
            for include_stats in [false, true] {
                assert_eq!(
                    tables(kind, &noise, include_stats).unwrap(),
                    tables(kind, &Params::new(), include_stats).unwrap(),
                    "{}",
                    kind
                );
            }
        }
    }

    #[test]
    fn test_include_stats_pulls_in_rollup() {
        assert_eq!(
            aliases(EntityKind::Advertiser, &Params::new(), true),
            vec!["a", "s", "d", "m"]
        );
        assert_eq!(aliases(EntityKind::Ad, &Params::new(), true), vec!["d", "s"]);
        // Entities without statistics ignore the flag.
        assert_eq!(aliases(EntityKind::Tracker, &Params::new(), true), vec!["t"]);
    }

    #[test]
    fn test_stats_filter_tables() {
        let params = Params::new().with("publisher_id", 4).with("advertiser_id", 2);
        assert_eq!(
            aliases(EntityKind::Advertiser, &params, true),
            vec!["a", "s", "d", "m", "z"]
        );
        assert_eq!(aliases(EntityKind::Advertiser, &params, false), vec!["a"]);
        assert_eq!(
            aliases(EntityKind::Ad, &Params::new().with("publisher_id", 3), true),
            vec!["d", "s", "z"]
        );
    }

    #[test]
    fn test_custom_rollup_table() {
        let params = Params::new().with("custom_table", "data_intermediate_ad_connection");
        let t = tables(EntityKind::HistoryDay, &params, false).unwrap();
        assert_eq!(t.first(), Some((DataIntermediateAdConnection, "s")));

        let bad = Params::new().with("custom_table", "zones");
        assert_eq!(
            tables(EntityKind::Stats, &bad, false),
            Err(ComposeError::UnknownTable("zones".to_string()))
        );
    }

    #[test]
    fn test_stats_by_entity_include_pulls_tables() {
        let params = Params::new().with("include", vec!["advertiser_id", "publisher_id"]);
        assert_eq!(
            aliases(EntityKind::StatsByEntity, &params, false),
            vec!["s", "m", "d", "z"]
        );
    }

    #[test]
    fn test_left_joined_tables() {
        assert_eq!(
            left_joined_tables(EntityKind::HistoryMonth, &Params::new()),
            vec![Zones, Affiliates]
        );
        assert!(left_joined_tables(EntityKind::StatsByEntity, &Params::new()).is_empty());

        let params = Params::new()
            .with("agency_id", 1)
            .with("exclude", vec!["zone_id"]);
        assert_eq!(
            left_joined_tables(EntityKind::StatsByEntity, &params),
            vec![Zones, Affiliates]
        );
        assert!(left_joined_tables(EntityKind::Zone, &params).is_empty());
    }
}
