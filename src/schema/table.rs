use std::str::FromStr;

use crate::config::BuilderConfig;
use crate::error::ComposeError;
use crate::sql::TableRef;

/// Logical tables of the ad-serving schema.
///
/// Each logical table has one fixed alias, which is what keeps aliases
/// unique within any query built from these tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Agency,
    Clients,
    Campaigns,
    Banners,
    Affiliates,
    Zones,
    Trackers,
    CampaignsTrackers,
    Variables,
    Category,
    Channel,
    AclsChannel,
    Acls,
    Images,
    AdCategoryAssoc,
    AdZoneAssoc,
    PlacementZoneAssoc,
    DataSummaryAdHourly,
    DataIntermediateAdConnection,
    DataSummaryAdArrivalHourly,
}

impl Table {
    pub const ALL: [Table; 20] = [
        Table::Agency,
        Table::Clients,
        Table::Campaigns,
        Table::Banners,
        Table::Affiliates,
        Table::Zones,
        Table::Trackers,
        Table::CampaignsTrackers,
        Table::Variables,
        Table::Category,
        Table::Channel,
        Table::AclsChannel,
        Table::Acls,
        Table::Images,
        Table::AdCategoryAssoc,
        Table::AdZoneAssoc,
        Table::PlacementZoneAssoc,
        Table::DataSummaryAdHourly,
        Table::DataIntermediateAdConnection,
        Table::DataSummaryAdArrivalHourly,
    ];

    /// Logical name, also the key for physical-name overrides.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Agency => "agency",
            Table::Clients => "clients",
            Table::Campaigns => "campaigns",
            Table::Banners => "banners",
            Table::Affiliates => "affiliates",
            Table::Zones => "zones",
            Table::Trackers => "trackers",
            Table::CampaignsTrackers => "campaigns_trackers",
            Table::Variables => "variables",
            Table::Category => "category",
            Table::Channel => "channel",
            Table::AclsChannel => "acls_channel",
            Table::Acls => "acls",
            Table::Images => "images",
            Table::AdCategoryAssoc => "ad_category_assoc",
            Table::AdZoneAssoc => "ad_zone_assoc",
            Table::PlacementZoneAssoc => "placement_zone_assoc",
            Table::DataSummaryAdHourly => "data_summary_ad_hourly",
            Table::DataIntermediateAdConnection => "data_intermediate_ad_connection",
            Table::DataSummaryAdArrivalHourly => "data_summary_ad_arrival_hourly",
        }
    }

    /// Physical name used when the configuration has no override.
    pub fn default_name(&self) -> &'static str {
        self.as_str()
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Table::Agency => "g",
            Table::Clients => "a",
            Table::Campaigns => "m",
            Table::Banners => "d",
            Table::Affiliates => "p",
            Table::Zones => "z",
            Table::Trackers => "t",
            Table::CampaignsTrackers => "mt",
            Table::Variables => "v",
            Table::Category => "cat",
            Table::Channel => "ch",
            Table::AclsChannel => "chl",
            Table::Acls => "l",
            Table::Images => "i",
            Table::AdCategoryAssoc => "ac",
            Table::AdZoneAssoc => "az",
            Table::PlacementZoneAssoc => "pz",
            Table::DataSummaryAdHourly
            | Table::DataIntermediateAdConnection
            | Table::DataSummaryAdArrivalHourly => "s",
        }
    }
}

impl FromStr for Table {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ComposeError::UnknownTable(s.to_string()))
    }
}

/// Table requirement map: logical table -> alias, in first-insertion order.
///
/// Adding a table that is already present is a no-op, so the first table
/// added (the entity's base table) stays first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables(Vec<(Table, &'static str)>);

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(tables: &[Table]) -> Self {
        let mut out = Self::new();
        out.add_all(tables);
        out
    }

    pub fn add(&mut self, table: Table) -> &mut Self {
        if !self.contains(table) {
            self.0.push((table, table.alias()));
        }
        self
    }

    pub fn add_all(&mut self, tables: &[Table]) -> &mut Self {
        for t in tables {
            self.add(*t);
        }
        self
    }

    pub fn merge(&mut self, other: &Tables) -> &mut Self {
        for (t, _) in &other.0 {
            self.add(*t);
        }
        self
    }

    pub fn contains(&self, table: Table) -> bool {
        self.0.iter().any(|(t, _)| *t == table)
    }

    pub fn alias_of(&self, table: Table) -> Option<&'static str> {
        self.0.iter().find(|(t, _)| *t == table).map(|(_, a)| *a)
    }

    pub fn aliases(&self) -> Vec<&'static str> {
        self.0.iter().map(|(_, a)| *a).collect()
    }

    pub fn first(&self) -> Option<(Table, &'static str)> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Table, &'static str)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve to physical table references.
    pub fn table_refs(&self, config: &BuilderConfig) -> Vec<TableRef> {
        self.0
            .iter()
            .map(|(t, alias)| TableRef::new(config.table_name(*t), *alias))
            .collect()
    }
}
