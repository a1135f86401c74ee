mod dashboard;
mod health;
mod helpers;
mod user;

pub(crate) use dashboard::cmd_dashboard;
pub(crate) use health::{cmd_bmi, cmd_protein};
pub(crate) use user::{cmd_user_add, cmd_user_list, cmd_user_rotate_token};
