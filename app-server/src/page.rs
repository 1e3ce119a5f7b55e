//! Server-rendered chat page.

use std::fmt::Write;

use lexsen_answer::{Role, Turn};

use crate::assets::FLAG_ROUTE;

pub const PAGE_TITLE: &str = "LexSen : VOTRE ASSISTANT JURIDIQUE SÉNÉGALAIS";
pub const INPUT_LABEL: &str = "Posez votre question juridique :";
pub const INPUT_PLACEHOLDER: &str =
    "Ex: Quels sont les droits des femmes dans le code de la famille ?";
pub const SUBMIT_LABEL: &str = "Envoyer";
pub const BUSY_TEXT: &str = "Recherche juridique en cours...";

const USER_ICON: &str = "";
const ASSISTANT_ICON: &str = "⚖️";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; color: #1a1a1a; }
aside { width: 300px; padding: 1.5rem; background: #f0f2f6; min-height: 100vh; box-sizing: border-box; }
main { flex: 1; padding: 2rem; max-width: 1100px; }
header { display: flex; align-items: center; gap: 20px; }
h1 { font-size: 36px; margin-top: 30px; }
.welcome { background: #f9f9f9; padding: 20px; border-radius: 12px; border: 1px solid #ddd; font-size: 20px; line-height: 1.6; margin-bottom: 25px; }
.turn { display: flex; align-items: flex-start; margin-bottom: 10px; }
.icon { font-size: 30px; margin-right: 10px; min-width: 30px; }
.bubble { padding: 15px; border-radius: 12px; max-width: 85%; font-size: 20px; color: #000; }
.user .bubble { background: #DCF8C6; }
.assistant .bubble { background: #E6E6E6; }
form input[type=text] { width: 100%; border-radius: 25px; padding: 16px; font-size: 18px; border: 1px solid #ccc; box-sizing: border-box; }
form button { margin-top: 10px; padding: 8px 20px; font-size: 16px; }
#busy { display: none; margin-top: 10px; font-style: italic; }
"#;

const FLAG_ALT: &str = "Drapeau du Sénégal et balance de la justice";

const SIDEBAR: &str = r#"<aside>
<h2>ℹ️ Informations</h2>
<p><strong>📚 Domaines de droit pris en charge :</strong></p>
<ul>
<li>Droit civil et procédure civile</li>
<li>Droit pénal et procédure pénale</li>
<li>Droit social</li>
<li>Organisation judiciaire</li>
<li>Organisation de l’administration</li>
<li>Droit OHADA</li>
</ul>
<p><strong>📞 Assistance technique :</strong></p>
<ul><li>WhatsApp : +221 77 339 76 94</li></ul>
<p>ℹ️ <strong>Dernière mise à jour des textes : Avril 2025</strong></p>
</aside>"#;

const WELCOME: &str = r#"<div class="welcome">
👋 Bonjour ! Je suis <strong>LexSen</strong>, votre assistant juridique spécialisé dans le droit sénégalais.<br><br>
Posez-moi vos questions sur :
<ul>
<li>📘 Le code de la famille ou du travail</li>
<li>⚖️ Le code pénal et la procédure pénale</li>
<li>📄 Les lois, décrets, arrêtés etc.</li>
</ul>
</div>"#;

/// Render the full page for a transcript.
///
/// With `show_flag` the title is preceded by the image served under
/// [`FLAG_ROUTE`].
pub fn render(turns: &[Turn], show_flag: bool) -> String {
    let mut html = String::with_capacity(8 * 1024);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Chatbot Juridique SN</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         {SIDEBAR}\n<main>\n<header>\n"
    );
    if show_flag {
        let _ = writeln!(
            html,
            "<img class=\"flag\" src=\"{FLAG_ROUTE}\" alt=\"{FLAG_ALT}\" width=\"120\">"
        );
    }
    let _ = write!(
        html,
        "<h1>{PAGE_TITLE}</h1>\n</header>\n<hr>\n{WELCOME}\n<section id=\"transcript\">\n"
    );

    for turn in turns {
        render_turn(&mut html, turn);
    }

    let _ = write!(
        html,
        "</section>\n\
         <form method=\"post\" action=\"/ask\" \
         onsubmit=\"document.getElementById('busy').style.display='block'\">\n\
         <label for=\"question\">{INPUT_LABEL}</label>\n\
         <input type=\"text\" id=\"question\" name=\"question\" placeholder=\"{}\" \
         autocomplete=\"off\" autofocus>\n\
         <button type=\"submit\">{SUBMIT_LABEL}</button>\n\
         <div id=\"busy\">{BUSY_TEXT}</div>\n\
         </form>\n</main>\n</body>\n</html>\n",
        escape(INPUT_PLACEHOLDER)
    );

    html
}

fn render_turn(html: &mut String, turn: &Turn) {
    let (class, icon) = match turn.role {
        Role::User => ("user", USER_ICON),
        Role::Assistant => ("assistant", ASSISTANT_ICON),
    };
    let mut body = escape(&turn.content);
    if turn.role == Role::Assistant {
        body = linkify(&body);
    }
    let body = body.replace('\n', "<br>\n");
    let _ = writeln!(
        html,
        "<div class=\"turn {class}\"><div class=\"icon\">{icon}</div>\
         <div class=\"bubble\">{body}</div></div>"
    );
}

/// Wrap `http(s)://` URLs of already escaped text in links.
///
/// A URL runs up to the next whitespace.
fn linkify(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(start) = find_url(rest) {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);
        let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        let (url, after) = tail.split_at(end);
        if url.ends_with("://") {
            out.push_str(url);
        } else {
            let _ = write!(
                out,
                "<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{url}</a>"
            );
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

fn find_url(text: &str) -> Option<usize> {
    [text.find("https://"), text.find("http://")].into_iter().flatten().min()
}

/// Escape text for HTML element and attribute content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x&y")</script>'"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;&#39;"
        );
    }

    #[test]
    fn test_empty_page_has_chrome() {
        let html = render(&[], false);

        assert!(html.contains(PAGE_TITLE));
        assert!(html.contains(INPUT_LABEL));
        assert!(html.contains(SUBMIT_LABEL));
        assert!(html.contains(BUSY_TEXT));
        assert!(html.contains("WhatsApp : +221 77 339 76 94"));
        assert!(html.contains("Avril 2025"));
        assert!(!html.contains("class=\"turn"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_flag_precedes_title_when_available() {
        let html = render(&[], true);

        assert!(html.contains(&format!("<img class=\"flag\" src=\"{FLAG_ROUTE}\"")));
        let flag = html.find("<img").unwrap();
        assert!(html.find("<header>").unwrap() < flag);
        assert!(flag < html.find(PAGE_TITLE).unwrap());
        assert!(html.find("</aside>").unwrap() < flag);
    }

    #[test]
    fn test_turns_render_in_order_and_escaped() {
        let turns = vec![
            Turn::user("<b>Bonjour</b>"),
            Turn::assistant("Bonjour !\nComment puis-je vous aider ?"),
        ];

        let html = render(&turns, false);

        let user = html.find("&lt;b&gt;Bonjour&lt;/b&gt;").unwrap();
        let assistant = html.find("Bonjour !<br>\nComment").unwrap();
        assert!(user < assistant);
        assert!(!html.contains("<b>Bonjour</b>"));
        assert!(html.contains("class=\"turn user\""));
        assert!(html.contains("class=\"turn assistant\""));
    }

    #[test]
    fn test_source_urls_become_links() {
        let turns = vec![Turn::assistant(
            "🔎 Sources utilisées :\n\n📚 Droit pénal / Code pénal / Article 364\n\
             → https://example.sn/code-penal?art=364&v=2",
        )];

        let html = render(&turns, false);

        assert!(html.contains(
            "→ <a href=\"https://example.sn/code-penal?art=364&amp;v=2\" target=\"_blank\" \
             rel=\"noopener noreferrer\">https://example.sn/code-penal?art=364&amp;v=2</a>"
        ));
    }

    #[test]
    fn test_linkify_keeps_attributes_escaped() {
        assert_eq!(
            linkify(&escape(r#"voir http://x.sn/"onmouseover="alert(1) ici"#)),
            "voir <a href=\"http://x.sn/&quot;onmouseover=&quot;alert(1)\" target=\"_blank\" \
             rel=\"noopener noreferrer\">http://x.sn/&quot;onmouseover=&quot;alert(1)</a> ici"
        );
        assert_eq!(linkify("javascript:alert(1)"), "javascript:alert(1)");
        assert_eq!(linkify("→ https://"), "→ https://");
        assert_eq!(linkify("→ "), "→ ");
    }

    #[test]
    fn test_user_turns_are_not_linked() {
        let html = render(&[Turn::user("https://example.sn")], false);
        assert!(!html.contains("<a href"));
    }
}
