use super::models::{Account, AccountForm};
use super::services::AccountsService;
use super::validators::EmptyBalance;
use crate::auth::AuthedUser;
use crate::common::{
    escape_html, is_valid_id, redirect_found, views, ApiError, ClientIp, EntityPrefix,
    SharedState,
};
use crate::session::{FlashKind, Session};
use axum::{
    extract::{Extension, Form, Path},
    response::{Html, IntoResponse, Response},
};
use tracing::{info, warn};

fn account_row(account: &Account) -> String {
    let id = escape_html(&account.id);
    let user_id = escape_html(&account.user_id);
    let name = escape_html(&account.name);
    format!(
        "<tr><td>{id}</td><td>{user_id}</td><td>{name}</td><td>{balance:.2}</td><td>{created}</td>\
         <td><form method=\"post\" action=\"/accounts/update/{id}\">\
         <input type=\"hidden\" name=\"user-id\" value=\"{user_id}\">\
         <input name=\"name\" value=\"{name}\">\
         <input name=\"balance\" value=\"{balance:.2}\">\
         <button type=\"submit\">Save</button></form></td></tr>\n",
        balance = account.balance,
        created = escape_html(&account.created_at),
    )
}

const CREATE_ACCOUNT_FORM: &str = r#"<form method="post" action="/accounts">
<input name="user-id" placeholder="User ID" required>
<input name="name" placeholder="Account name">
<input name="balance" placeholder="0.00">
<button type="submit">Add account</button>
</form>"#;

/// GET /accounts - Account list, newest first
pub async fn list_accounts(
    Extension(state): Extension<SharedState>,
    AuthedUser(profile): AuthedUser,
    session: Session,
) -> Result<Response, ApiError> {
    let db = state.read().await.db.clone();
    let accounts = AccountsService::new(db).list_accounts().await?;

    let table = if accounts.is_empty() {
        "<p>No accounts yet.</p>".to_string()
    } else {
        let rows: String = accounts.iter().map(account_row).collect();
        format!(
            "<table>\n<thead><tr><th>ID</th><th>User</th><th>Name</th><th>Balance</th><th>Created</th><th></th></tr></thead>\n<tbody>\n{}</tbody>\n</table>",
            rows
        )
    };
    let content = format!(
        "<h1>Accounts</h1>\n{}\n<h2>New account</h2>\n{}",
        table, CREATE_ACCOUNT_FORM
    );
    let flashes = session.take_all_flashes();

    Ok(Html(views::layout("Accounts", Some(&profile), &flashes, &content)).into_response())
}

/// POST /accounts - Create an account from a form
pub async fn create_account(
    Extension(state): Extension<SharedState>,
    ClientIp(client_ip): ClientIp,
    session: Session,
    Form(form): Form<AccountForm>,
) -> Result<Response, ApiError> {
    let input = form.parse(EmptyBalance::Zero)?;

    let db = state.read().await.db.clone();
    let account = AccountsService::new(db).create_account(input).await?;

    info!(account_id = %account.id, client_ip = %client_ip, "Account created");
    if let Err(e) = session.set_flash(FlashKind::Success, "Account created") {
        warn!(error = %e, "Failed to store flash message");
    }

    Ok(redirect_found("/accounts"))
}

/// POST /accounts/update/:id - Replace an account's fields from a form
pub async fn update_account(
    Extension(state): Extension<SharedState>,
    ClientIp(client_ip): ClientIp,
    session: Session,
    Path(account_id): Path<String>,
    Form(form): Form<AccountForm>,
) -> Result<Response, ApiError> {
    if !is_valid_id(EntityPrefix::Account, &account_id) {
        return Err(ApiError::BadRequest("Invalid account id".to_string()));
    }
    let input = form.parse(EmptyBalance::Reject)?;

    let db = state.read().await.db.clone();
    AccountsService::new(db)
        .update_account(&account_id, input)
        .await?;

    info!(account_id = %account_id, client_ip = %client_ip, "Account updated");
    if let Err(e) = session.set_flash(FlashKind::Success, "Account updated") {
        warn!(error = %e, "Failed to store flash message");
    }

    Ok(redirect_found("/accounts"))
}
