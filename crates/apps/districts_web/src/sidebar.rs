use foundation::ids::PolygonId;
use query::tracker::FetchState;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarItem {
    pub id: PolygonId,
    pub name: String,
    pub judicial_name: String,
}

/// What the result list shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "items", rename_all = "snake_case")]
pub enum SidebarStatus {
    LocatingUser,
    Loading,
    Failed,
    Empty,
    Results(Vec<SidebarItem>),
}

pub fn sidebar_status(locating: bool, fetch: &FetchState) -> SidebarStatus {
    if locating {
        return SidebarStatus::LocatingUser;
    }
    match fetch {
        FetchState::Idle => SidebarStatus::Empty,
        FetchState::Loading(_) => SidebarStatus::Loading,
        FetchState::Failed { .. } => SidebarStatus::Failed,
        FetchState::Ready { results, .. } if results.is_empty() => SidebarStatus::Empty,
        FetchState::Ready { results, .. } => SidebarStatus::Results(
            results
                .iter()
                .map(|r| SidebarItem {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    judicial_name: r.judicial.name.clone(),
                })
                .collect(),
        ),
    }
}
