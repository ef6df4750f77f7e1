//! Glob matching for parameter paths.

/// Match `text` against a glob `pattern` where `*` matches any (possibly
/// empty) sequence and `?` matches exactly one character.
pub fn match_pattern(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut star_text = 0usize;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            star_text = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            star_text += 1;
            ti = star_text;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        assert!(match_pattern("/a/b", "/a/b"));
        assert!(!match_pattern("/a/b", "/a/bc"));
    }

    #[test]
    fn test_wildcards() {
        let path = "/GISASSimulation/MultiLayer/Layer0/ParticleLayout/Particle/FormFactorCylinder/radius";
        assert!(match_pattern("*/FormFactorCylinder/radius", path));
        assert!(match_pattern("*radius", path));
        assert!(match_pattern("/GISASSimulation/*/Layer?/*", path));
        assert!(!match_pattern("*/FormFactorBox/*", path));
        assert!(match_pattern("*", ""));
    }
}
