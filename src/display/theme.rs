//! Terminal display styles.
//!
//! All styles use only named ANSI colors (Black, Red, Green, Yellow, Blue,
//! Magenta, Cyan, White) so that colors adapt to the user's terminal theme.
//! Avoid `Color::Rgb`, `Color::AnsiValue`, and bright variants — these bypass
//! the user's palette and may be unreadable on some backgrounds.
//!
//! Use `Attribute::Dim` / `Attribute::Bold` for emphasis rather than bright
//! color variants.

use crossterm::style::{Attribute, Attributes, Color, ContentStyle};

pub fn dim() -> ContentStyle {
    ContentStyle {
        attributes: Attribute::Dim.into(),
        ..Default::default()
    }
}

pub fn dim_italic() -> ContentStyle {
    ContentStyle {
        attributes: Attributes::from(Attribute::Dim) | Attribute::Italic,
        ..Default::default()
    }
}

pub fn bold() -> ContentStyle {
    ContentStyle {
        attributes: Attribute::Bold.into(),
        ..Default::default()
    }
}

pub fn banner() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Blue),
        attributes: Attribute::Bold.into(),
        ..Default::default()
    }
}

pub fn assistant_label() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Cyan),
        attributes: Attribute::Bold.into(),
        ..Default::default()
    }
}

pub fn tool_name() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Yellow),
        ..Default::default()
    }
}

pub fn field() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Cyan),
        ..Default::default()
    }
}

pub fn error() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Red),
        ..Default::default()
    }
}

pub fn error_banner() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Red),
        attributes: Attribute::Bold.into(),
        ..Default::default()
    }
}

pub fn success() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Green),
        ..Default::default()
    }
}

pub fn result_line() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Green),
        attributes: Attribute::Bold.into(),
        ..Default::default()
    }
}

pub fn todo_done() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Green),
        ..Default::default()
    }
}

pub fn todo_active() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Yellow),
        ..Default::default()
    }
}

pub fn bar_ok() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Green),
        ..Default::default()
    }
}

pub fn bar_warn() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Yellow),
        ..Default::default()
    }
}

pub fn bar_hot() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Red),
        ..Default::default()
    }
}

pub fn queue_selected() -> ContentStyle {
    ContentStyle {
        foreground_color: Some(Color::Magenta),
        attributes: Attribute::Bold.into(),
        ..Default::default()
    }
}
