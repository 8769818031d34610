//! Splitting a full unified diff into per-file hunks.

use std::collections::HashMap;

use super::numstat::strip_snapshot;

const FILE_HEADER: &str = "diff --git ";

/// Map each file (snapshot prefix removed) to the hunk text of its segment.
///
/// Segments without a hunk (binary files, pure renames) are left out.
pub fn split_patches(output: &str) -> HashMap<String, String> {
    let mut patches = HashMap::new();
    let mut segment: Vec<&str> = Vec::new();

    for line in output.lines() {
        if line.starts_with(FILE_HEADER) && !segment.is_empty() {
            insert_segment(&segment, &mut patches);
            segment.clear();
        }
        segment.push(line);
    }
    if !segment.is_empty() {
        insert_segment(&segment, &mut patches);
    }

    patches
}

fn insert_segment(segment: &[&str], patches: &mut HashMap<String, String>) {
    let Some(name) = segment_filename(segment) else {
        return;
    };
    let Some(start) = segment.iter().position(|line| line.starts_with("@@")) else {
        return;
    };
    patches.insert(name, segment[start..].join("\n"));
}

fn segment_filename(segment: &[&str]) -> Option<String> {
    let header = segment.first()?;
    if !header.starts_with(FILE_HEADER) {
        return None;
    }

    let from_marker = |marker: &str, side: &str| {
        segment
            .iter()
            .find_map(|line| line.strip_prefix(marker))
            .map(|rest| rest.split('\t').next().unwrap_or(rest))
            .filter(|path| *path != "/dev/null")
            .map(|path| path.strip_prefix(side).unwrap_or(path).to_string())
    };

    let path = from_marker("+++ ", "b/")
        .or_else(|| from_marker("rename to ", ""))
        .or_else(|| from_marker("--- ", "a/"))
        .or_else(|| {
            let rest = &header[FILE_HEADER.len()..];
            rest.rfind(" b/").map(|at| rest[at + 3..].to_string())
        })?;

    Some(strip_snapshot(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
diff --git a/before/a.txt b/after/a.txt
index 3b18e51..a042389 100644
--- a/before/a.txt
+++ b/after/a.txt
@@ -1,2 +1,2 @@
 hello
-world
+there
diff --git a/after/new.txt b/after/new.txt
new file mode 100644
index 0000000..e69de29
--- /dev/null
+++ b/after/new.txt
@@ -0,0 +1 @@
+added
diff --git a/before/gone.txt b/before/gone.txt
deleted file mode 100644
--- a/before/gone.txt
+++ /dev/null
@@ -1 +0,0 @@
-removed
diff --git a/before/logo.png b/after/logo.png
index 1111111..2222222 100644
Binary files a/before/logo.png and b/after/logo.png differ
";

    #[test]
    fn test_segments_keyed_by_file() {
        let patches = split_patches(SAMPLE);
        assert_eq!(patches["a.txt"], "@@ -1,2 +1,2 @@\n hello\n-world\n+there");
        assert_eq!(patches["new.txt"], "@@ -0,0 +1 @@\n+added");
        assert_eq!(patches["gone.txt"], "@@ -1 +0,0 @@\n-removed");
    }

    #[test]
    fn test_binary_segment_has_no_patch() {
        assert!(!split_patches(SAMPLE).contains_key("logo.png"));
    }

    #[test]
    fn test_header_fallback_for_spaces() {
        let output = "diff --git a/before/my file.txt b/after/my file.txt\n--- a/before/my file.txt\t\n+++ b/after/my file.txt\t\n@@ -1 +1 @@\n-a\n+b\n";
        let patches = split_patches(output);
        assert_eq!(patches["my file.txt"], "@@ -1 +1 @@\n-a\n+b");
    }

    #[test]
    fn test_empty_output() {
        assert!(split_patches("").is_empty());
    }
}
