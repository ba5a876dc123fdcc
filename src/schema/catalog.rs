/// Foreign-key relations between logical tables.
///
/// Declaration order is the order structural predicates enter the pool, and
/// the planner takes the first linking predicate it finds, so reordering
/// this list changes the composed SQL.
use super::table::{Table, Tables};
use crate::sql::{ColumnRef, Predicate};

pub struct Relation {
    pub left: Table,
    pub left_column: &'static str,
    pub right: Table,
    pub right_column: &'static str,
}

const fn rel(
    left: Table,
    left_column: &'static str,
    right: Table,
    right_column: &'static str,
) -> Relation {
    Relation {
        left,
        left_column,
        right,
        right_column,
    }
}

pub const RELATIONS: &[Relation] = &[
    rel(Table::Agency, "agencyid", Table::Clients, "agencyid"),
    rel(Table::Agency, "agencyid", Table::Affiliates, "agencyid"),
    rel(Table::Affiliates, "affiliateid", Table::Zones, "affiliateid"),
    rel(Table::Clients, "clientid", Table::Campaigns, "clientid"),
    rel(Table::Clients, "clientid", Table::Trackers, "clientid"),
    rel(Table::Campaigns, "campaignid", Table::Banners, "campaignid"),
    rel(Table::Campaigns, "campaignid", Table::PlacementZoneAssoc, "placement_id"),
    rel(Table::Campaigns, "campaignid", Table::CampaignsTrackers, "campaignid"),
    rel(Table::Trackers, "trackerid", Table::CampaignsTrackers, "trackerid"),
    rel(Table::Trackers, "trackerid", Table::Variables, "trackerid"),
    rel(Table::Banners, "bannerid", Table::DataSummaryAdHourly, "ad_id"),
    rel(Table::Banners, "bannerid", Table::DataIntermediateAdConnection, "ad_id"),
    rel(Table::Banners, "bannerid", Table::DataSummaryAdArrivalHourly, "ad_id"),
    rel(Table::Banners, "bannerid", Table::AdCategoryAssoc, "ad_id"),
    rel(Table::Banners, "bannerid", Table::AdZoneAssoc, "ad_id"),
    rel(Table::Banners, "bannerid", Table::Acls, "bannerid"),
    rel(Table::Banners, "campaignid", Table::PlacementZoneAssoc, "placement_id"),
    rel(Table::Zones, "zoneid", Table::DataSummaryAdHourly, "zone_id"),
    rel(Table::Zones, "zoneid", Table::DataIntermediateAdConnection, "zone_id"),
    rel(Table::Zones, "zoneid", Table::DataSummaryAdArrivalHourly, "zone_id"),
    rel(Table::Zones, "zoneid", Table::AdZoneAssoc, "zone_id"),
    rel(Table::Zones, "zoneid", Table::PlacementZoneAssoc, "zone_id"),
    rel(Table::Affiliates, "affiliateid", Table::Channel, "affiliateid"),
];

/// Equi-join predicates for every catalog relation whose two tables are both
/// present, qualified with the aliases of `tables`.
pub fn structural_joins(tables: &Tables) -> Vec<Predicate> {
    RELATIONS
        .iter()
        .filter_map(|r| {
            let left = tables.alias_of(r.left)?;
            let right = tables.alias_of(r.right)?;
            Some(Predicate::join(
                ColumnRef::new(left, r.left_column),
                ColumnRef::new(right, r.right_column),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(tables: &[Table]) -> Vec<String> {
        structural_joins(&Tables::of(tables))
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn test_pair_needs_both_tables() {
        assert!(rendered(&[Table::Zones]).is_empty());
        assert_eq!(
            rendered(&[Table::Zones, Table::Affiliates]),
            vec!["p.affiliateid=z.affiliateid"]
        );
    }

    #[test]
    fn test_emission_follows_declaration_order() {
        // Requirement order is reversed on purpose.
        assert_eq!(
            rendered(&[
                Table::DataSummaryAdHourly,
                Table::Zones,
                Table::Banners,
                Table::Campaigns,
                Table::Clients,
            ]),
            vec![
                "a.clientid=m.clientid",
                "m.campaignid=d.campaignid",
                "d.bannerid=s.ad_id",
                "z.zoneid=s.zone_id",
            ]
        );
    }

    #[test]
    fn test_every_rollup_table_links_banners_and_zones() {
        for rollup in [
            Table::DataSummaryAdHourly,
            Table::DataIntermediateAdConnection,
            Table::DataSummaryAdArrivalHourly,
        ] {
            assert_eq!(
                rendered(&[rollup, Table::Banners, Table::Zones]),
                vec!["d.bannerid=s.ad_id", "z.zoneid=s.zone_id"]
            );
        }
    }
}
