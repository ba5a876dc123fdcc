/// Filter predicates derived from request parameters.
///
/// Independent of table selection: only the parameter map and the entity
/// kind are read. Every alias a filter mentions must be a table `tables()`
/// adds for the same keys; the composer tests check that pairing.
use super::kind::EntityKind;
use super::params::Params;
use super::tables::rollup_table;
use super::table::Table;
use crate::sql::{ColumnRef, CompareOp, Literal, Predicate};

/// How a single-valued filter is rendered. Multi-valued filters are always
/// `IN (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitationMode {
    Equal,
    NotEqual,
    Bitwise,
}

/// Parameters whose values are quoted as text; everything else is numeric.
const STRING_FIELDS: &[&str] = &[
    "ad_type",
    "ad_active",
    "placement_active",
    "placement_anonymous",
    "name",
    "file_name",
];

/// Append the filter for `key` on `column` to `out`.
pub fn add_limitation(
    out: &mut Vec<Predicate>,
    key: &str,
    column: &str,
    value: &str,
    mode: LimitationMode,
) {
    let quoted = STRING_FIELDS.contains(&key);
    let mut values: Vec<Literal> = value
        .split(',')
        .map(|v| if quoted { Literal::text(v) } else { Literal::numeric(v) })
        .collect();
    let column = ColumnRef::parse(column);

    let predicate = if values.len() > 1 {
        Predicate::InList { column, values }
    } else {
        let value = values.remove(0);
        match mode {
            LimitationMode::Equal => Predicate::compare(column, CompareOp::Eq, value),
            LimitationMode::NotEqual => Predicate::compare(column, CompareOp::NotEq, value),
            LimitationMode::Bitwise => Predicate::BitwiseAny {
                column,
                mask: value,
            },
        }
    };
    out.push(predicate);
}

/// Filter builder bound to one parameter map.
struct Filters<'a> {
    params: &'a Params,
    out: Vec<Predicate>,
}

impl<'a> Filters<'a> {
    fn new(params: &'a Params) -> Self {
        Self {
            params,
            out: Vec::new(),
        }
    }

    /// `column = value` when `key` holds a non-empty, non-zero value.
    fn filled(&mut self, key: &str, column: &str) -> &mut Self {
        if self.params.is_filled(key) {
            self.push(key, column, LimitationMode::Equal);
        }
        self
    }

    /// `column = value` whenever `key` is present, even empty or zero.
    fn set(&mut self, key: &str, column: &str) -> &mut Self {
        if self.params.is_set(key) {
            self.push(key, column, LimitationMode::Equal);
        }
        self
    }

    fn push(&mut self, key: &str, column: &str, mode: LimitationMode) {
        if let Some(value) = self.params.joined(key) {
            add_limitation(&mut self.out, key, column, &value, mode);
        }
    }

    fn ad_filters(&mut self) -> &mut Self {
        self.set("ad_width", "d.width")
            .set("ad_height", "d.height")
            .filled("ad_type", "d.storagetype")
            .filled("ad_active", "d.active")
    }

    fn placement_filters(&mut self) -> &mut Self {
        self.filled("placement_active", "m.active")
            .filled("placement_anonymous", "m.anonymous")
    }

    fn zone_filters(&mut self) -> &mut Self {
        if self.params.is_filled("zone_inventory_forecast_type") {
            self.push(
                "zone_inventory_forecast_type",
                "z.inventory_forecast_type",
                LimitationMode::Bitwise,
            );
        }
        self
    }

    fn date_range(&mut self, table: Table) {
        let (column, begin_suffix, end_suffix) = match table {
            Table::DataIntermediateAdConnection => ("s.tracker_date_time", " 00:00:00", " 23:59:59"),
            _ => ("s.day", "", ""),
        };
        if let Some(day) = self.filled_scalar("day_begin") {
            let bound = format!("{}{}", day, begin_suffix);
            self.out.push(Predicate::compare(
                ColumnRef::parse(column),
                CompareOp::GtEq,
                Literal::text(&bound),
            ));
        }
        if let Some(day) = self.filled_scalar("day_end") {
            let bound = format!("{}{}", day, end_suffix);
            self.out.push(Predicate::compare(
                ColumnRef::parse(column),
                CompareOp::LtEq,
                Literal::text(&bound),
            ));
        }
    }

    fn filled_scalar(&self, key: &str) -> Option<&'a str> {
        if self.params.is_filled(key) {
            self.params.scalar(key)
        } else {
            None
        }
    }

    fn finish(self) -> Vec<Predicate> {
        self.out
    }
}

/// Ordered filter predicates for `kind`.
pub fn limitations(kind: EntityKind, params: &Params) -> Vec<Predicate> {
    let mut f = Filters::new(params);

    // Shared filters, only for kinds whose table rules bring in the
    // referenced table.
    match kind {
        EntityKind::Ad
        | EntityKind::Advertiser
        | EntityKind::AdCategoryAssoc
        | EntityKind::Placement => {
            f.ad_filters().placement_filters();
        }
        EntityKind::AdZoneAssoc | EntityKind::Agency => {
            f.ad_filters().placement_filters().zone_filters();
        }
        EntityKind::PlacementZoneAssoc => {
            f.placement_filters().zone_filters();
        }
        EntityKind::Publisher | EntityKind::Zone => {
            f.zone_filters();
        }
        k if k.is_rollup() => {
            f.ad_filters().placement_filters().zone_filters();
        }
        _ => {}
    }

    match kind {
        EntityKind::Ad => {
            f.filled("agency_id", "a.agencyid")
                .filled("advertiser_id", "m.clientid")
                .filled("placement_id", "d.campaignid")
                .filled("ad_id", "d.bannerid");
        }
        EntityKind::Advertiser => {
            f.filled("agency_id", "a.agencyid")
                .filled("advertiser_id", "a.clientid")
                .filled("placement_id", "m.campaignid")
                .filled("ad_id", "d.bannerid");
        }
        EntityKind::AdCategoryAssoc => {
            f.filled("agency_id", "a.agencyid")
                .filled("advertiser_id", "m.clientid")
                .filled("placement_id", "d.campaignid")
                .filled("ad_id", "ac.ad_id")
                .filled("ad_category_assoc_id", "ac.ad_category_assoc_id");
        }
        EntityKind::AdZoneAssoc => {
            f.filled("agency_id", "p.agencyid")
                .filled("agency_id", "a.agencyid")
                .filled("publisher_id", "z.affiliateid")
                .filled("advertiser_id", "m.clientid")
                .filled("zone_id", "az.zone_id")
                .filled("placement_id", "d.campaignid")
                .filled("ad_id", "az.ad_id")
                .filled("ad_zone_assoc_id", "az.ad_zone_assoc_id");
        }
        EntityKind::Agency => {
            f.filled("agency_id", "g.agencyid")
                .filled("advertiser_id", "a.clientid")
                .filled("placement_id", "m.campaignid")
                .filled("ad_id", "d.bannerid")
                .filled("publisher_id", "p.affiliateid")
                .filled("zone_id", "z.zoneid");
        }
        EntityKind::Category => {
            f.filled("name", "cat.name");
        }
        EntityKind::Channel => {
            if params.is_set("publisher_id") {
                f.set("publisher_id", "ch.affiliateid");
            } else if params.scalar("channel_type") == Some("publisher") {
                add_limitation(
                    &mut f.out,
                    "publisher_id",
                    "ch.affiliateid",
                    "0",
                    LimitationMode::NotEqual,
                );
            }
            f.filled("channel_id", "ch.channelid")
                .set("agency_id", "ch.agencyid");
        }
        EntityKind::ChannelLimitation => {
            f.filled("channel_id", "chl.channelid");
        }
        EntityKind::Image => {
            f.filled("file_name", "i.filename");
        }
        EntityKind::Limitation => {
            f.filled("agency_id", "a.agencyid")
                .filled("advertiser_id", "m.clientid")
                .filled("placement_id", "d.campaignid")
                .filled("ad_id", "l.bannerid");
        }
        EntityKind::Placement => {
            f.filled("agency_id", "a.agencyid")
                .filled("advertiser_id", "m.clientid")
                .filled("placement_id", "m.campaignid")
                .filled("ad_id", "d.bannerid");
        }
        EntityKind::PlacementTracker => {
            f.filled("agency_id", "a.agencyid")
                .filled("advertiser_id", "m.clientid")
                .filled("advertiser_id", "t.clientid")
                .filled("tracker_id", "mt.trackerid")
                .filled("placement_id", "mt.campaignid");
        }
        EntityKind::PlacementZoneAssoc => {
            f.filled("agency_id", "p.agencyid")
                .filled("agency_id", "a.agencyid")
                .filled("publisher_id", "z.affiliateid")
                .filled("advertiser_id", "m.clientid")
                .filled("zone_id", "pz.zone_id")
                .filled("placement_id", "pz.placement_id")
                .filled("ad_id", "d.bannerid")
                .filled("placement_zone_assoc_id", "pz.placement_zone_assoc_id");
        }
        EntityKind::Publisher => {
            f.filled("agency_id", "p.agencyid")
                .filled("publisher_id", "p.affiliateid")
                .filled("zone_id", "z.zoneid");
        }
        EntityKind::Stats
        | EntityKind::HistorySpan
        | EntityKind::HistoryDay
        | EntityKind::HistoryMonth
        | EntityKind::HistoryDow
        | EntityKind::HistoryHour
        | EntityKind::StatsByEntity => {
            rollup_filters(&mut f, params);
            if kind == EntityKind::StatsByEntity
                && params.is_set("zone_id")
                && params.scalar("zone_id").map(str::trim) == Some("0")
            {
                add_limitation(&mut f.out, "zone_id", "s.zone_id", "0", LimitationMode::Equal);
            }
        }
        EntityKind::Tracker => {
            f.filled("agency_id", "a.agencyid")
                .filled("advertiser_id", "t.clientid")
                .filled("tracker_id", "t.trackerid")
                .filled("placement_id", "mt.campaignid")
                .filled("ad_id", "d.bannerid");
        }
        EntityKind::Variable => {
            f.filled("agency_id", "a.agencyid")
                .filled("advertiser_id", "t.clientid")
                .filled("tracker_id", "v.trackerid")
                .filled("variable_id", "v.variableid");
        }
        EntityKind::Zone => {
            f.filled("agency_id", "p.agencyid")
                .filled("publisher_id", "z.affiliateid")
                .filled("zone_id", "z.zoneid")
                .set("zone_type", "z.delivery")
                .set("zone_width", "z.width")
                .set("zone_height", "z.height");
        }
    }

    f.finish()
}

fn rollup_filters(f: &mut Filters<'_>, params: &Params) {
    if params.is_filled("agency_id") {
        let by_zone = params.is_filled("publisher_id")
            || params.is_filled("zone_id")
            || ["zone_type", "zone_width", "zone_height"]
                .iter()
                .any(|k| params.is_set(k));
        if by_zone {
            f.filled("agency_id", "p.agencyid");
        }
        f.filled("agency_id", "a.agencyid");
    }
    f.filled("publisher_id", "z.affiliateid")
        .filled("advertiser_id", "m.clientid")
        .filled("zone_id", "s.zone_id")
        .filled("placement_id", "d.campaignid")
        .filled("ad_id", "s.ad_id");
    // An unknown custom table fails table selection; filters fall back to
    // the day column.
    let table = rollup_table(params).unwrap_or(Table::DataSummaryAdHourly);
    f.date_range(table);
}

/// Filters applied when statistics are joined onto an entity select.
pub fn stats_limitations(kind: EntityKind, params: &Params) -> Vec<Predicate> {
    let mut f = Filters::new(params);
    match kind {
        EntityKind::Advertiser | EntityKind::Placement | EntityKind::Ad => {
            f.filled("agency_id", "a.agencyid");
        }
        EntityKind::Publisher | EntityKind::Zone => {
            f.filled("agency_id", "p.agencyid");
        }
        _ => {
            f.filled("agency_id", "p.agencyid")
                .filled("agency_id", "a.agencyid");
        }
    }
    f.filled("publisher_id", "z.affiliateid")
        .filled("advertiser_id", "m.clientid")
        .filled("zone_id", "s.zone_id")
        .filled("placement_id", "d.campaignid")
        .filled("ad_id", "s.ad_id");
    f.date_range(Table::DataSummaryAdHourly);
    f.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(kind: EntityKind, params: &Params) -> Vec<String> {
        limitations(kind, params).iter().map(|p| p.to_string()).collect()
    }

    fn single(key: &str, column: &str, value: &str, mode: LimitationMode) -> String {
        let mut out = Vec::new();
        add_limitation(&mut out, key, column, value, mode);
        out[0].to_string()
    }

    #[test]
    fn test_limitation_quoting() {
        assert_eq!(
            single("placement_id", "d.campaignid", "1,2,3", LimitationMode::Equal),
            "d.campaignid IN (1,2,3)"
        );
        assert_eq!(
            single("ad_type", "d.storagetype", "a,b", LimitationMode::Equal),
            "d.storagetype IN ('a','b')"
        );
        assert_eq!(
            single("advertiser_id", "m.clientid", "5", LimitationMode::Equal),
            "m.clientid=5"
        );
        assert_eq!(
            single("ad_active", "d.active", "t", LimitationMode::Equal),
            "d.active='t'"
        );
    }

    #[test]
    fn test_limitation_modes() {
        assert_eq!(
            single("publisher_id", "ch.affiliateid", "0", LimitationMode::NotEqual),
            "ch.affiliateid!=0"
        );
        assert_eq!(
            single("zone_inventory_forecast_type", "z.inventory_forecast_type", "8", LimitationMode::Bitwise),
            "(z.inventory_forecast_type & 8 > 0)"
        );
        // Several values override the mode.
        assert_eq!(
            single("publisher_id", "ch.affiliateid", "1,2", LimitationMode::NotEqual),
            "ch.affiliateid IN (1,2)"
        );
    }

    #[test]
    fn test_values_are_escaped() {
        assert_eq!(
            single("name", "cat.name", "O'Reilly", LimitationMode::Equal),
            "cat.name='O''Reilly'"
        );
        assert_eq!(
            single("agency_id", "p.agencyid", "1 OR 1=1", LimitationMode::Equal),
            "p.agencyid='1 OR 1=1'"
        );
    }

    #[test]
    fn test_placement_by_advertiser() {
        let params = Params::new().with("advertiser_id", 5);
        assert_eq!(rendered(EntityKind::Placement, &params), vec!["m.clientid=5"]);
    }

    #[test]
    fn test_ad_zone_assoc_order() {
        let params = Params::new().with("ad_id", 2).with("zone_id", 1);
        assert_eq!(
            rendered(EntityKind::AdZoneAssoc, &params),
            vec!["az.zone_id=1", "az.ad_id=2"]
        );
    }

    #[test]
    fn test_zone_dimension_filters_accept_zero() {
        let params = Params::new().with("zone_width", 0).with("zone_id", 0);
        assert_eq!(rendered(EntityKind::Zone, &params), vec!["z.width=0"]);
    }

    #[test]
    fn test_channel_filters() {
        let zero = Params::new().with("publisher_id", 0).with("agency_id", 2);
        assert_eq!(
            rendered(EntityKind::Channel, &zero),
            vec!["ch.affiliateid=0", "ch.agencyid=2"]
        );
        let publisher_owned = Params::new().with("channel_type", "publisher");
        assert_eq!(
            rendered(EntityKind::Channel, &publisher_owned),
            vec!["ch.affiliateid!=0"]
        );
        assert!(rendered(EntityKind::Channel, &Params::new().with("channel_type", "agency")).is_empty());
    }

    #[test]
    fn test_rollup_agency_filter_by_zone() {
        let params = Params::new().with("agency_id", 1);
        assert_eq!(rendered(EntityKind::Stats, &params), vec!["a.agencyid=1"]);

        let params = params.with("publisher_id", 9);
        assert_eq!(
            rendered(EntityKind::HistoryDay, &params),
            vec!["p.agencyid=1", "a.agencyid=1", "z.affiliateid=9"]
        );
    }

    #[test]
    fn test_date_ranges() {
        let params = Params::new()
            .with("day_begin", "2007-01-01")
            .with("day_end", "2007-01-31");
        assert_eq!(
            rendered(EntityKind::HistoryDay, &params),
            vec!["s.day>='2007-01-01'", "s.day<='2007-01-31'"]
        );

        let params = params.with("custom_table", "data_intermediate_ad_connection");
        assert_eq!(
            rendered(EntityKind::Stats, &params),
            vec![
                "s.tracker_date_time>='2007-01-01 00:00:00'",
                "s.tracker_date_time<='2007-01-31 23:59:59'"
            ]
        );
    }

    #[test]
    fn test_stats_by_entity_explicit_zone_zero() {
        let params = Params::new().with("zone_id", "0");
        assert_eq!(rendered(EntityKind::StatsByEntity, &params), vec!["s.zone_id=0"]);
        assert!(rendered(EntityKind::Stats, &params).is_empty());
    }

    #[test]
    fn test_shared_filters_follow_table_rules() {
        let params = Params::new().with("ad_width", 120).with("zone_inventory_forecast_type", 4);
        assert_eq!(rendered(EntityKind::Placement, &params), vec!["d.width=120"]);
        assert_eq!(
            rendered(EntityKind::Zone, &params),
            vec!["(z.inventory_forecast_type & 4 > 0)"]
        );
        assert!(rendered(EntityKind::Tracker, &params).is_empty());
    }

    #[test]
    fn test_unrelated_params_do_not_change_limitations() {
        let noise = Params::new().with("unrelated", "7").with("sort", "name");
        for kind in EntityKind::ALL {
            assert!(limitations(kind, &noise).is_empty(), "{}", kind);
        }
    }

    #[test]
    fn test_stats_limitations() {
        let params = Params::new().with("agency_id", 3).with("day_begin", "2007-02-01");
        let render = |kind| -> Vec<String> {
            stats_limitations(kind, &params).iter().map(|p| p.to_string()).collect()
        };
        assert_eq!(render(EntityKind::Ad), vec!["a.agencyid=3", "s.day>='2007-02-01'"]);
        assert_eq!(render(EntityKind::Zone), vec!["p.agencyid=3", "s.day>='2007-02-01'"]);
        assert_eq!(
            render(EntityKind::Agency),
            vec!["p.agencyid=3", "a.agencyid=3", "s.day>='2007-02-01'"]
        );
    }
}
