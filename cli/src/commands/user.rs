use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use mealwise_core::db::Database;
use mealwise_core::models::NewUserToken;

use super::helpers::truncate;

fn print_new_token(created: &NewUserToken, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(created)?);
        return Ok(());
    }
    let user = &created.user;
    println!("User:  {} <{}> (id {})", user.full_name, user.email, user.id);
    println!("Token: {}", created.token);
    eprintln!("Store this token now. It will not be shown again.");
    Ok(())
}

pub(crate) fn cmd_user_add(db: &Database, email: &str, full_name: &str, json: bool) -> Result<()> {
    let created = db.create_user(email, full_name)?;
    print_new_token(&created, json)
}

pub(crate) fn cmd_user_rotate_token(db: &Database, email: &str, json: bool) -> Result<()> {
    let rotated = db.rotate_token(email)?;
    print_new_token(&rotated, json)
}

pub(crate) fn cmd_user_list(db: &Database, json: bool) -> Result<()> {
    let users = db.list_users()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users yet. Create one with `mealwise user add <email> <name>`.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct UserRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Email")]
        email: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Created")]
        created: String,
    }

    let rows: Vec<UserRow> = users
        .iter()
        .map(|u| UserRow {
            id: u.id,
            email: u.email.clone(),
            name: truncate(&u.full_name, 30),
            created: u.created_at.clone(),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}
