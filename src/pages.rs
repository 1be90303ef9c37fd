//! Server-rendered pages: embedded templates with placeholder substitution.

const INDEX: &str = include_str!("templates/index.html");
const SIGNIN: &str = include_str!("templates/signin.html");
const SIGNUP: &str = include_str!("templates/signup.html");
const DASHBOARD: &str = include_str!("templates/dashboard.html");
const DELETE_ACCOUNT: &str = include_str!("templates/delete_account.html");

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn flash_block(flash: Option<&str>) -> String {
    match flash {
        Some(msg) => format!(r#"<p class="flash">{}</p>"#, escape_html(msg)),
        None => String::new(),
    }
}

pub fn index(logged_in: bool) -> String {
    let nav = if logged_in {
        r#"<a href="/dashboard">Dashboard</a> | <a href="/signout">Sign out</a>"#
    } else {
        r#"<a href="/signin">Sign in</a> | <a href="/signup">Sign up</a>"#
    };
    INDEX.replace("{{nav}}", nav)
}

pub fn signin(flash: Option<&str>) -> String {
    SIGNIN.replace("{{flash}}", &flash_block(flash))
}

pub fn signup(flash: Option<&str>) -> String {
    SIGNUP.replace("{{flash}}", &flash_block(flash))
}

pub fn dashboard(username: &str) -> String {
    DASHBOARD.replace("{{username}}", &escape_html(username))
}

pub fn delete_account() -> String {
    DELETE_ACCOUNT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_navigation_tracks_session_state() {
        let page = index(false);
        assert!(page.contains(r#"href="/signin""#));
        assert!(page.contains(r#"href="/signup""#));

        let page = index(true);
        assert!(page.contains(r#"href="/dashboard""#));
        assert!(page.contains(r#"href="/signout""#));
    }

    #[test]
    fn signin_form_posts_to_auth() {
        let page = signin(None);
        assert!(page.contains(r#"action="/auth""#));
        assert!(!page.contains("{{flash}}"));
        assert!(!page.contains("class=\"flash\""));
    }

    #[test]
    fn signup_form_posts_to_register() {
        let page = signup(None);
        assert!(page.contains(r#"action="/register""#));
    }

    #[test]
    fn flash_message_is_rendered_and_escaped() {
        let page = signin(Some("Email or password is incorrect."));
        assert!(page.contains("Email or password is incorrect."));

        let page = signin(Some("<script>alert(1)</script>"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn dashboard_escapes_the_username() {
        let page = dashboard("<b>dave</b>");
        assert!(!page.contains("<b>dave</b>"));
        assert!(page.contains("&lt;b&gt;dave&lt;/b&gt;"));
    }

    #[test]
    fn delete_account_page_confirms_before_posting() {
        let page = delete_account();
        assert!(page.contains(r#"action="/user/delete_confirm""#));
    }
}
