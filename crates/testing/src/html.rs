//! Sample markup for tests that need representative login-page HTML without
//! a real browser. These match the selectors `authscope-authdetect`'s
//! password/MFA probes and `authscope-idp`'s keyword recognizer look for
//! (`input[type="password"]`, SSO button text), so a test that parses one
//! of these with an HTML-aware tool exercises the same shape real pages
//! have.

/// A bare username/password form, no SSO or passkey affordances.
pub const PASSWORD_ONLY_LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
  <form action="/login" method="post">
    <input type="text" name="username" placeholder="Username">
    <input type="password" name="password" placeholder="Password">
    <button type="submit">Sign in</button>
  </form>
</body>
</html>
"#;

/// A login page offering Google and Microsoft SSO buttons alongside a
/// password form.
pub const SSO_AND_PASSWORD_LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
  <div class="sso-buttons">
    <button id="google-login" class="btn-google">Sign in with Google</button>
    <button id="microsoft-login" class="btn-microsoft">Sign in with Microsoft</button>
  </div>
  <form action="/login" method="post">
    <input type="email" name="email" placeholder="Email">
    <input type="password" name="password" placeholder="Password">
    <button type="submit">Sign in</button>
  </form>
</body>
</html>
"#;

/// A login page offering a passkey/WebAuthn affordance plus a fallback
/// password form with an MFA step implied by a "verification code" field.
pub const PASSKEY_AND_MFA_LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
  <button id="passkey-button" data-webauthn="true">Sign in with a passkey</button>
  <form action="/login" method="post">
    <input type="text" name="username" placeholder="Username">
    <input type="password" name="password" placeholder="Password">
    <input type="text" name="otp" placeholder="Verification code" autocomplete="one-time-code">
    <button type="submit">Sign in</button>
  </form>
</body>
</html>
"#;

/// A minimal `robots.txt` with a disallowed admin path and an allowed login
/// path, matching what `authscope-candidates::robots` looks for.
pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /admin\nAllow: /login\nSitemap: /sitemap.xml\n";

/// A two-entry sitemap with one login-shaped URL.
pub const SITEMAP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/login</loc></url>
</urlset>
"#;
