//! Stats command handler

use anyhow::Result;

use teamdash_core::query::{build_user_view, ServerStats};
use teamdash_core::Dashboard;

use crate::output::Output;

/// Show dashboard statistics over every server and user
pub fn show(dashboard: &Dashboard, output: &Output) -> Result<()> {
    let store = dashboard.store();
    let servers = ServerStats::from_servers(store.servers());
    let users = build_user_view(store, dashboard.view_state()).stats;

    output.print_stats(&servers, &users);
    Ok(())
}
