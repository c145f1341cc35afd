use std::path::Path;

pub const USER_TOKEN: &str = "$USER";
pub const SSHKEY_TOKEN: &str = "$SSHKEY";

/// Substitute `$USER` and `$SSHKEY` in a unit template.
///
/// The template is scanned once, left to right, so text coming from the
/// substituted values is never expanded again.
pub fn render(template: &str, user: &str, ssh_key: &Path) -> String {
    let key = ssh_key.to_string_lossy();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix(SSHKEY_TOKEN) {
            out.push_str(&key);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(USER_TOKEN) {
            out.push_str(user);
            rest = after;
        } else {
            out.push('$');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}
