//! User command handlers

use anyhow::Result;

use teamdash_core::Dashboard;

use crate::output::Output;
use crate::prompt::confirm;
use crate::resolve;

/// List users with their server counts
pub fn list(dashboard: &mut Dashboard, search: Option<String>, output: &Output) -> Result<()> {
    if let Some(term) = search {
        dashboard.view_state_mut().set_user_search(term);
    }
    output.print_users(&dashboard.user_view());
    Ok(())
}

/// Add a user
pub async fn add(dashboard: &mut Dashboard, name: &str, output: &Output) -> Result<()> {
    let user = dashboard.add_user(name).await?;
    output.id(&user.id);
    Ok(())
}

/// Rename a user
pub async fn edit(dashboard: &mut Dashboard, user: &str, name: &str, output: &Output) -> Result<()> {
    let user_id = resolve::user(dashboard.store(), user)?.id.clone();
    dashboard.update_user(&user_id, name).await?;
    output.id(&user_id);
    Ok(())
}

/// Delete a user; their servers become unassigned
pub async fn delete(dashboard: &mut Dashboard, user: &str, output: &Output) -> Result<()> {
    let user = resolve::user(dashboard.store(), user)?;
    let user_id = user.id.clone();

    if output.should_prompt() {
        let owned = dashboard.store().servers_assigned_to(&user_id);
        println!("Delete user: {} ({} server(s) will be unassigned)", user.name, owned);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    dashboard.delete_user(&user_id).await?;
    Ok(())
}
