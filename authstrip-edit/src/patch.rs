use camino::Utf8Path;
use diffy::PatchFormatter;

/// Renders a git-style unified diff for every changed file, in input order.
pub fn render_patch<'a, I>(changes: I) -> String
where
    I: IntoIterator<Item = (&'a Utf8Path, &'a str, &'a str)>,
{
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for (path, old, new) in changes {
        if old == new {
            continue;
        }

        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

        let patch = diffy::create_patch(old, new);
        let body = formatter.fmt_patch(&patch).to_string();
        // diffy repeats its own ---/+++ header; keep only the hunks.
        let hunks = body
            .find("\n@@")
            .map(|idx| &body[idx + 1..])
            .unwrap_or(body.as_str());
        out.push_str(hunks);
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}
