/// Whether the terminal is likely light or dark, used to pick readable
/// foreground colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

const PREFER_DARK_ENV: &str = "GTK_PREFER_DARK";

/// `GTK_PREFER_DARK` wins when it holds a recognizable boolean; otherwise the
/// OS app-theme preference is consulted. Returns None if nothing is known.
pub fn detect_preferred_appearance() -> Option<Appearance> {
    std::env::var(PREFER_DARK_ENV)
        .ok()
        .and_then(|value| parse_prefer_dark(&value))
        .or_else(detect_via_os_hint)
}

fn parse_prefer_dark(value: &str) -> Option<Appearance> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(Appearance::Dark),
        "0" | "false" | "no" => Some(Appearance::Light),
        _ => None,
    }
}

fn detect_via_os_hint() -> Option<Appearance> {
    #[cfg(target_os = "macos")]
    {
        use std::process::Command;
        // Prints "Dark" in dark mode; the key is absent (non-zero exit) in light mode.
        let output = Command::new("/usr/bin/defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .ok()?;
        let dark = output.status.success()
            && String::from_utf8_lossy(&output.stdout)
                .to_ascii_lowercase()
                .contains("dark");
        return Some(if dark {
            Appearance::Dark
        } else {
            Appearance::Light
        });
    }

    #[cfg(target_os = "windows")]
    {
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::RegKey;
        let personalize = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize")
            .ok()?;
        // 1 = light, 0 = dark
        let light: u32 = personalize.get_value("AppsUseLightTheme").ok()?;
        return Some(if light == 0 {
            Appearance::Dark
        } else {
            Appearance::Light
        });
    }

    #[cfg(target_os = "linux")]
    {
        let scheme = gsettings_interface("color-scheme")?;
        if scheme.contains("prefer-dark") {
            return Some(Appearance::Dark);
        }
        if scheme.contains("default") || scheme.contains("prefer-light") {
            return Some(Appearance::Light);
        }
        // Older GNOME: dark variants carry "-dark" in the theme name.
        let theme = gsettings_interface("gtk-theme")?;
        Some(if theme.contains("-dark") {
            Appearance::Dark
        } else {
            Appearance::Light
        })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(target_os = "linux")]
fn gsettings_interface(key: &str) -> Option<String> {
    let output = std::process::Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", key])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefer_dark_values_are_parsed() {
        for value in ["1", "true", "YES", " True "] {
            assert_eq!(parse_prefer_dark(value), Some(Appearance::Dark), "{value}");
        }
        for value in ["0", "false", "No"] {
            assert_eq!(parse_prefer_dark(value), Some(Appearance::Light), "{value}");
        }
    }

    #[test]
    fn unrecognized_prefer_dark_defers_to_os() {
        assert_eq!(parse_prefer_dark(""), None);
        assert_eq!(parse_prefer_dark("maybe"), None);
    }
}
