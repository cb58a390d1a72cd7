// Server-rendered page chrome shared by the HTML handlers

use super::helpers::escape_html;
use crate::auth::models::LoggedInUser;
use crate::session::FlashMessages;

/// Renders pending flash messages, one `<div class="flash flash-KIND">` each
pub fn flash_banner(flashes: &FlashMessages) -> String {
    flashes
        .iter()
        .map(|(kind, message)| {
            format!(
                "<div class=\"flash flash-{}\">{}</div>\n",
                kind.as_str(),
                escape_html(message)
            )
        })
        .collect()
}

fn profile_nav(user: Option<&LoggedInUser>) -> String {
    match user {
        Some(user) => {
            let picture = if user.picture.is_empty() {
                String::new()
            } else {
                format!(
                    "<img src=\"{}\" alt=\"\" width=\"32\" height=\"32\"> ",
                    escape_html(&user.picture)
                )
            };
            format!(
                "<nav>{}<span class=\"name\">{}</span> <span class=\"email\">{}</span> \
                 <a href=\"/\">Users</a> <a href=\"/accounts\">Accounts</a> <a href=\"/logout\">Logout</a></nav>",
                picture,
                escape_html(&user.name),
                escape_html(&user.email)
            )
        }
        None => "<nav><a href=\"/login\">Login</a></nav>".to_string(),
    }
}

/// Full HTML document; `content` must already be escaped
pub fn layout(
    title: &str,
    user: Option<&LoggedInUser>,
    flashes: &FlashMessages,
    content: &str,
) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n{}<main>\n{}\n</main>\n</body>\n</html>\n",
        escape_html(title),
        profile_nav(user),
        flash_banner(flashes),
        content
    )
}
