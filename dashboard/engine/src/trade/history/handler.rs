use crate::store;
use crate::trade::history::HistoryEntry;
use itertools::chain;
use itertools::Itertools;
use markets::AssetId;

/// Everything that ever completed, most recent first.
///
/// Trade fills and contract settlements are stored as separate append-only
/// streams; merging and ordering them happens here, on every read.
pub fn get_history() -> Vec<HistoryEntry> {
    store::read(|store| {
        chain![
            store.fills.iter().cloned().map(HistoryEntry::Trade),
            store
                .settlements
                .iter()
                .cloned()
                .map(HistoryEntry::Settlement),
        ]
        .sorted_by(|a, b| b.timestamp().cmp(&a.timestamp()))
        .collect()
    })
}

/// The slice of history belonging to one asset, for the detail page.
pub fn get_asset_history(asset: &AssetId) -> Vec<HistoryEntry> {
    get_history()
        .into_iter()
        .filter(|entry| entry.asset() == asset)
        .collect()
}
