//! Server-rendered pages: the landing redirect, the public pages and the
//! application shell.
//!
//! Page content is a placeholder shell; the gate decides whether a page is
//! served at all, these handlers only decide what a served page contains.
use crate::app::AppState;
use crate::identity::CookieIdentity;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use pathexplorer_authz::{landing_route, navigation_for};

/// `/`: send the visitor to the landing route of their role.
pub(crate) async fn landing(jar: CookieJar) -> Redirect {
    Redirect::temporary(landing_route(CookieIdentity::from_jar(&jar).role()))
}

pub(crate) async fn login_page() -> Html<String> {
    Html(page(
        "Iniciar sesión",
        r#"<form id="login" data-endpoint="/api/auth/login">
  <input name="email" type="email" required>
  <input name="password" type="password" required>
  <button type="submit">Entrar</button>
</form>
<a href="/forgot-password">¿Olvidaste tu contraseña?</a>
<a href="/register">Crear cuenta</a>"#,
    ))
}

pub(crate) async fn register_page() -> Html<String> {
    Html(page(
        "Crear cuenta",
        r#"<p>Solicita tu cuenta al administrador de tu departamento.</p>
<a href="/login">Volver</a>"#,
    ))
}

pub(crate) async fn forgot_password_page() -> Html<String> {
    Html(page(
        "Recuperar contraseña",
        r#"<p>Contacta a soporte para restablecer tu contraseña.</p>
<a href="/login">Volver</a>"#,
    ))
}

pub(crate) async fn unauthorized_page() -> Response {
    (
        StatusCode::FORBIDDEN,
        Html(page(
            "Acceso no autorizado",
            r#"<p>No tienes permiso para ver esta página.</p>
<a href="/">Ir al inicio</a>"#,
        )),
    )
        .into_response()
}

pub(crate) async fn restricted_access_page() -> Response {
    (
        StatusCode::FORBIDDEN,
        Html(page(
            "Acceso restringido",
            r#"<p>Esta sección no está disponible para tu rol.</p>
<a href="/">Ir al inicio</a>"#,
        )),
    )
        .into_response()
}

/// Every other path. The gate has already let the request through, so a
/// path with a table entry is a page the visitor may see; anything else is
/// a 404.
pub(crate) async fn app_shell(State(state): State<AppState>, jar: CookieJar, uri: Uri) -> Response {
    let path = uri.path();
    if state.policy.table().lookup(path).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Html(page(
                "Página no encontrada",
                &format!("<p>{} no existe.</p>", escape_html(path)),
            )),
        )
            .into_response();
    }

    let identity = CookieIdentity::from_jar(&jar);
    let mut body = String::new();
    if let Some(user) = identity.user() {
        body.push_str(&format!(
            "<header data-role=\"{}\">{}</header>\n<nav>\n",
            user.role,
            escape_html(&user.full_name())
        ));
        for item in navigation_for(user.role, state.policy.table()) {
            body.push_str(&format!(
                "  <a href=\"{}\">{}</a>\n",
                item.href,
                escape_html(item.title)
            ));
        }
        body.push_str("</nav>\n");
    }
    body.push_str(&format!(
        "<main id=\"app\" data-path=\"{}\"></main>",
        escape_html(path)
    ));
    Html(page("PathExplorer", &body)).into_response()
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"es\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n<h1>{}</h1>\n{body}\n</body>\n</html>\n",
        escape_html(title),
        escape_html(title)
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
        assert_eq!(escape_html("/proyectos/12"), "/proyectos/12");
    }

    #[test]
    fn page_wraps_title_and_body() {
        let html = page("Acceso <restringido>", "<p>hola</p>");
        assert!(html.contains("<title>Acceso &lt;restringido&gt;</title>"));
        assert!(html.contains("<p>hola</p>"));
    }
}
