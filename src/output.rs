// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Terminal output helpers for progress lines.

use std::fmt::Display;

use colored::Colorize;

pub fn print_success(message: impl Display) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_info(message: impl Display) {
    println!("{} {}", "ℹ".blue(), message);
}

pub fn print_warning(message: impl Display) {
    println!("{} {}", "!".yellow(), message);
}

pub fn print_error(message: impl Display) {
    eprintln!("{} {}", "✗".red(), message);
}
