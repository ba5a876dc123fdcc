use super::kind::EntityKind;
use super::params::Params;
use crate::config::BuilderConfig;
use crate::sql::{escape_string, Columns};

const SUM_COLUMNS: &[(&str, &str)] = &[
    ("SUM(s.requests)", "sum_requests"),
    ("SUM(s.impressions)", "sum_views"),
    ("SUM(s.clicks)", "sum_clicks"),
    ("SUM(s.conversions)", "sum_conversions"),
];

/// `include` names the stats_by_entity view understands, with the column
/// expression each one groups on.
pub const ENTITY_KEYS: &[(&str, &str)] = &[
    ("advertiser_id", "m.clientid"),
    ("placement_id", "d.campaignid"),
    ("publisher_id", "z.affiliateid"),
    ("ad_id", "s.ad_id"),
    ("zone_id", "s.zone_id"),
];

const NATURAL_KEY: &str = "CONCAT(s.ad_id, '_', s.zone_id)";

fn entity_key_expr(name: &str) -> Option<&'static str> {
    ENTITY_KEYS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, expr)| *expr)
}

/// Ordered select list for `kind`.
pub fn columns(kind: EntityKind, params: &Params, all_fields: bool, config: &BuilderConfig) -> Columns {
    let mut c = Columns::new();
    match kind {
        EntityKind::Ad => {
            c.extend_pairs(&[
                ("d.bannerid", "ad_id"),
                ("d.campaignid", "placement_id"),
                ("d.active", "active"),
                ("d.description", "name"),
                ("d.storagetype", "type"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("d.contenttype", "contenttype"),
                    ("d.pluginversion", "pluginversion"),
                    ("d.filename", "filename"),
                    ("d.imageurl", "imageurl"),
                    ("d.htmltemplate", "htmltemplate"),
                    ("d.htmlcache", "htmlcache"),
                    ("d.width", "width"),
                    ("d.height", "height"),
                    ("d.weight", "weight"),
                    ("d.seq", "seq"),
                    ("d.target", "target"),
                    ("d.url", "url"),
                    ("d.alt", "alt"),
                    ("d.status", "status"),
                    ("d.bannertext", "bannertext"),
                    ("d.autohtml", "autohtml"),
                    ("d.adserver", "adserver"),
                    ("d.block", "block"),
                    ("d.capping", "capping"),
                    ("d.session_capping", "session_capping"),
                    ("d.compiledlimitation", "compiledlimitation"),
                    ("d.append", "append"),
                    ("d.appendtype", "appendtype"),
                    ("d.bannertype", "bannertype"),
                    ("d.alt_filename", "alt_filename"),
                    ("d.alt_imageurl", "alt_imageurl"),
                    ("d.alt_contenttype", "alt_contenttype"),
                    ("d.comments", "comments"),
                    ("d.parameters", "parameters"),
                    ("d.transparent", "transparent"),
                ]);
            }
        }
        EntityKind::Advertiser => {
            c.extend_pairs(&[
                ("a.clientid", "advertiser_id"),
                ("a.agencyid", "agency_id"),
                ("a.clientname", "name"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("a.contact", "contact"),
                    ("a.email", "email"),
                    ("a.clientusername", "username"),
                    ("a.clientpassword", "password"),
                    ("a.permissions", "permissions"),
                    ("a.language", "language"),
                    ("a.report", "report"),
                    ("a.reportinterval", "report_interval"),
                    ("a.reportlastdate", "report_last_date"),
                    ("a.reportdeactivate", "report_deactivate"),
                ]);
            }
        }
        EntityKind::AdCategoryAssoc => c.extend_pairs(&[
            ("ac.ad_category_assoc_id", "ad_category_assoc_id"),
            ("ac.ad_id", "ad_id"),
            ("ac.category_id", "category_id"),
        ]),
        EntityKind::AdZoneAssoc => c.extend_pairs(&[
            ("az.ad_zone_assoc_id", "ad_zone_assoc_id"),
            ("az.ad_id", "ad_id"),
            ("az.zone_id", "zone_id"),
            ("az.priority", "priority"),
        ]),
        EntityKind::Agency => {
            c.extend_pairs(&[
                ("g.agencyid", "agency_id"),
                ("g.name", "name"),
                ("g.active", "active"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("g.contact", "contact"),
                    ("g.email", "email"),
                    ("g.username", "username"),
                    ("g.password", "password"),
                    ("g.permissions", "permissions"),
                    ("g.language", "language"),
                    ("g.logout_url", "logout_url"),
                ]);
            }
        }
        EntityKind::Category => {
            c.extend_pairs(&[("cat.category_id", "category_id"), ("cat.name", "name")])
        }
        EntityKind::Channel => {
            c.extend_pairs(&[
                ("ch.channelid", "channel_id"),
                ("ch.agencyid", "agency_id"),
                ("ch.affiliateid", "publisher_id"),
                ("ch.name", "name"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("ch.description", "description"),
                    ("ch.compiledlimitation", "compiledlimitation"),
                    ("ch.active", "active"),
                    ("ch.comments", "comments"),
                ]);
            }
        }
        EntityKind::ChannelLimitation => c.extend_pairs(&[
            ("chl.logical", "logical"),
            ("chl.type", "type"),
            ("chl.comparison", "comparison"),
            ("chl.data", "data"),
            ("chl.executionorder", "executionorder"),
        ]),
        EntityKind::Image => {
            c.push("i.filename", "file_name");
            if all_fields {
                c.extend_pairs(&[("i.t_stamp", "t_stamp"), ("i.contents", "contents")]);
            }
        }
        EntityKind::Limitation => c.extend_pairs(&[
            ("l.bannerid", "ad_id"),
            ("l.logical", "logical"),
            ("l.type", "type"),
            ("l.comparison", "comparison"),
            ("l.data", "data"),
            ("l.executionorder", "executionorder"),
        ]),
        EntityKind::Placement => {
            c.extend_pairs(&[
                ("m.clientid", "advertiser_id"),
                ("m.campaignid", "placement_id"),
                ("m.campaignname", "name"),
                ("m.active", "active"),
                ("m.anonymous", "anonymous"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("m.views", "views"),
                    ("m.clicks", "clicks"),
                    ("m.conversions", "conversions"),
                    ("m.expire", "expire"),
                    ("m.activate", "activate"),
                    ("m.priority", "priority"),
                    ("m.weight", "weight"),
                    ("m.target_impression", "target_impression"),
                    ("m.target_click", "target_click"),
                    ("m.target_conversion", "target_conversion"),
                ]);
            }
        }
        EntityKind::PlacementTracker => {
            c.extend_pairs(&[
                ("mt.campaign_trackerid", "placement_tracker_id"),
                ("mt.campaignid", "placement_id"),
                ("mt.trackerid", "tracker_id"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("mt.status", "status"),
                    ("mt.viewwindow", "view_window"),
                    ("mt.clickwindow", "click_window"),
                ]);
            }
        }
        EntityKind::PlacementZoneAssoc => c.extend_pairs(&[
            ("pz.placement_zone_assoc_id", "placement_zone_assoc_id"),
            ("pz.placement_id", "placement_id"),
            ("pz.zone_id", "zone_id"),
        ]),
        EntityKind::Publisher => {
            c.extend_pairs(&[
                ("p.affiliateid", "publisher_id"),
                ("p.agencyid", "agency_id"),
                ("p.name", "name"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("p.mnemonic", "mnemonic"),
                    ("p.contact", "contact"),
                    ("p.email", "email"),
                    ("p.website", "website"),
                    ("p.username", "username"),
                    ("p.password", "password"),
                    ("p.permissions", "permissions"),
                    ("p.language", "language"),
                    ("p.publiczones", "publiczones"),
                ]);
            }
        }
        EntityKind::Stats => {
            c.extend_pairs(&[("s.day", "day"), ("s.hour", "hour")]);
            c.extend_pairs(SUM_COLUMNS);
        }
        EntityKind::StatsByEntity => stats_by_entity(&mut c, params),
        EntityKind::HistorySpan => match params.columns("custom_columns") {
            Some(custom) => c.extend_columns(custom),
            None => c.push("MIN(s.day)", "start_date"),
        },
        EntityKind::HistoryDay => {
            c.push("s.day", "day");
            c.push(&date_format_expr(&config.date_format), "date_f");
            stats_common(&mut c, params);
        }
        EntityKind::HistoryMonth => {
            c.push("DATE_FORMAT(s.day, '%Y-%m')", "month");
            c.push(&date_format_expr(&config.month_format), "date_f");
            stats_common(&mut c, params);
        }
        EntityKind::HistoryDow => {
            c.push("(DAYOFWEEK(s.day) - 1)", "dow");
            stats_common(&mut c, params);
        }
        EntityKind::HistoryHour => {
            c.push("s.hour", "hour");
            stats_common(&mut c, params);
        }
        EntityKind::Tracker => {
            c.extend_pairs(&[
                ("t.clientid", "advertiser_id"),
                ("t.trackerid", "tracker_id"),
                ("t.trackername", "name"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("t.description", "description"),
                    ("t.viewwindow", "viewwindow"),
                    ("t.clickwindow", "clickwindow"),
                    ("t.blockwindow", "blockwindow"),
                    ("t.variablemethod", "variablemethod"),
                    ("t.appendcode", "appendcode"),
                ]);
            }
        }
        EntityKind::Variable => {
            c.extend_pairs(&[
                ("v.variableid", "variable_id"),
                ("v.trackerid", "tracker_id"),
                ("v.name", "name"),
                ("v.datatype", "type"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("v.description", "description"),
                    ("v.variablecode", "variablecode"),
                ]);
            }
        }
        EntityKind::Zone => {
            c.extend_pairs(&[
                ("z.zoneid", "zone_id"),
                ("z.affiliateid", "publisher_id"),
                ("z.zonename", "name"),
                ("z.delivery", "type"),
            ]);
            if all_fields {
                c.extend_pairs(&[
                    ("z.description", "description"),
                    ("z.width", "width"),
                    ("z.height", "height"),
                    ("z.chain", "chain"),
                    ("z.prepend", "prepend"),
                    ("z.append", "append"),
                    ("z.appendtype", "appendtype"),
                    ("z.forceappend", "forceappend"),
                    ("z.inventory_forecast_type", "inventory_forecast_type"),
                    ("z.comments", "comments"),
                    ("z.cost", "cost"),
                    ("z.cost_type", "cost_type"),
                    ("z.cost_variable_id", "cost_variable_id"),
                    ("z.technology_cost", "technology_cost"),
                    ("z.technology_cost_type", "technology_cost_type"),
                    ("z.block", "block"),
                    ("z.capping", "capping"),
                    ("z.session_capping", "session_capping"),
                    ("z.category", "category"),
                    ("z.ad_selection", "ad_selection"),
                ]);
            }
        }
    }
    c
}

fn date_format_expr(format: &str) -> String {
    format!("DATE_FORMAT(s.day, '{}')", escape_string(format))
}

/// Aggregates shared by the rollup views: the four sums, or `custom_columns`
/// in their place, followed by `add_columns`.
fn stats_common(c: &mut Columns, params: &Params) {
    match params.columns("custom_columns") {
        Some(custom) => c.extend_columns(custom),
        None => c.extend_pairs(SUM_COLUMNS),
    }
    if let Some(extra) = params.columns("add_columns") {
        c.extend_columns(extra);
    }
}

fn stats_by_entity(c: &mut Columns, params: &Params) {
    for name in ["advertiser_id", "placement_id", "publisher_id"] {
        if params.contains_in("include", name) {
            if let Some(expr) = entity_key_expr(name) {
                c.push(expr, name);
            }
        }
    }
    c.extend_pairs(&[(NATURAL_KEY, "pkey"), ("s.ad_id", "ad_id"), ("s.zone_id", "zone_id")]);
    stats_common(c, params);

    // Excluded key columns must leave the select list, otherwise they would
    // still split the groups. `pkey` is then rebuilt from what remains.
    let no_ad = params.contains_in("exclude", "ad_id");
    let no_zone = params.contains_in("exclude", "zone_id");
    if no_ad {
        c.remove_expr(NATURAL_KEY);
        c.remove_expr("s.ad_id");
        if no_zone {
            c.remove_expr("s.zone_id");
            let parts: Vec<&str> = params
                .list("include")
                .into_iter()
                .filter_map(entity_key_expr)
                .collect();
            if parts.is_empty() {
                c.push("(0)", "pkey");
            } else {
                c.push(&format!("CONCAT({})", parts.join(", '_', ")), "pkey");
            }
        } else {
            c.push("(s.zone_id)", "pkey");
        }
    } else if no_zone {
        c.remove_expr(NATURAL_KEY);
        c.remove_expr("s.zone_id");
        c.push("(s.ad_id)", "pkey");
    }
}

/// Aggregate columns joined onto an entity select in statistics mode.
pub fn stats_columns(kind: EntityKind) -> Columns {
    let mut c = Columns::new();
    c.extend_pairs(SUM_COLUMNS);
    if let Some((expr, name)) = kind.stats_key() {
        c.push(expr, name);
    }
    c
}

/// GROUP BY output names for `kind`; empty means no GROUP BY.
pub fn group_columns(kind: EntityKind, params: &Params) -> Vec<String> {
    match kind {
        EntityKind::HistoryDay => vec!["day".to_string()],
        EntityKind::HistoryMonth => vec!["month".to_string()],
        EntityKind::HistoryDow => vec!["dow".to_string()],
        EntityKind::HistoryHour => vec!["hour".to_string()],
        EntityKind::StatsByEntity => {
            let mut group: Vec<String> = vec!["ad_id".to_string(), "zone_id".to_string()];
            for name in params.list("include") {
                if entity_key_expr(name).is_some() && !group.iter().any(|g| g == name) {
                    group.push(name.to_string());
                }
            }
            let exclude = params.list("exclude");
            group.retain(|g| !exclude.contains(&g.as_str()));
            group
        }
        _ => Vec::new(),
    }
}
