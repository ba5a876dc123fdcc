use std::fmt;
use std::str::FromStr;

use crate::error::ComposeError;

/// Every entity the composer knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Ad,
    Advertiser,
    AdCategoryAssoc,
    AdZoneAssoc,
    Agency,
    Category,
    Channel,
    ChannelLimitation,
    Image,
    Limitation,
    Placement,
    PlacementTracker,
    PlacementZoneAssoc,
    Publisher,
    Stats,
    StatsByEntity,
    HistorySpan,
    HistoryDay,
    HistoryMonth,
    HistoryDow,
    HistoryHour,
    Tracker,
    Variable,
    Zone,
}

impl EntityKind {
    pub const ALL: [EntityKind; 24] = [
        EntityKind::Ad,
        EntityKind::Advertiser,
        EntityKind::AdCategoryAssoc,
        EntityKind::AdZoneAssoc,
        EntityKind::Agency,
        EntityKind::Category,
        EntityKind::Channel,
        EntityKind::ChannelLimitation,
        EntityKind::Image,
        EntityKind::Limitation,
        EntityKind::Placement,
        EntityKind::PlacementTracker,
        EntityKind::PlacementZoneAssoc,
        EntityKind::Publisher,
        EntityKind::Stats,
        EntityKind::StatsByEntity,
        EntityKind::HistorySpan,
        EntityKind::HistoryDay,
        EntityKind::HistoryMonth,
        EntityKind::HistoryDow,
        EntityKind::HistoryHour,
        EntityKind::Tracker,
        EntityKind::Variable,
        EntityKind::Zone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Ad => "ad",
            EntityKind::Advertiser => "advertiser",
            EntityKind::AdCategoryAssoc => "ad_category_assoc",
            EntityKind::AdZoneAssoc => "ad_zone_assoc",
            EntityKind::Agency => "agency",
            EntityKind::Category => "category",
            EntityKind::Channel => "channel",
            EntityKind::ChannelLimitation => "channel_limitation",
            EntityKind::Image => "image",
            EntityKind::Limitation => "limitation",
            EntityKind::Placement => "placement",
            EntityKind::PlacementTracker => "placement_tracker",
            EntityKind::PlacementZoneAssoc => "placement_zone_assoc",
            EntityKind::Publisher => "publisher",
            EntityKind::Stats => "stats",
            EntityKind::StatsByEntity => "stats_by_entity",
            EntityKind::HistorySpan => "history_span",
            EntityKind::HistoryDay => "history_day",
            EntityKind::HistoryMonth => "history_month",
            EntityKind::HistoryDow => "history_dow",
            EntityKind::HistoryHour => "history_hour",
            EntityKind::Tracker => "tracker",
            EntityKind::Variable => "variable",
            EntityKind::Zone => "zone",
        }
    }

    /// Pre-aggregated statistics views read from the rollup table.
    pub fn is_rollup(&self) -> bool {
        matches!(
            self,
            EntityKind::Stats
                | EntityKind::StatsByEntity
                | EntityKind::HistorySpan
                | EntityKind::HistoryDay
                | EntityKind::HistoryMonth
                | EntityKind::HistoryDow
                | EntityKind::HistoryHour
        )
    }

    /// Rollup views that left-join zones and publishers so deleted zones and
    /// direct selection still show up.
    pub fn is_history(&self) -> bool {
        matches!(
            self,
            EntityKind::HistorySpan
                | EntityKind::HistoryDay
                | EntityKind::HistoryMonth
                | EntityKind::HistoryDow
                | EntityKind::HistoryHour
        )
    }

    /// The id column (expression, output name) statistics are keyed by, for
    /// entities that can carry joined statistics.
    pub fn stats_key(&self) -> Option<(&'static str, &'static str)> {
        match self {
            EntityKind::Ad => Some(("d.bannerid", "ad_id")),
            EntityKind::Advertiser => Some(("a.clientid", "advertiser_id")),
            EntityKind::Agency => Some(("g.agencyid", "agency_id")),
            EntityKind::Placement => Some(("m.campaignid", "placement_id")),
            EntityKind::Publisher => Some(("p.affiliateid", "publisher_id")),
            EntityKind::Zone => Some(("z.zoneid", "zone_id")),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ComposeError::UnknownEntity(s.to_string()))
    }
}
