use colored::Colorize;
use envforge_core::Profile;

pub fn handle() {
    println!("{}", "Available profiles:".bold());
    for profile in Profile::ALL {
        println!("  {} {}", format!("{:<14}", profile.name()).cyan(), profile.description());
        let kinds: Vec<String> = profile.kinds().iter().map(|k| k.to_string()).collect();
        println!("  {:<14} {}", "", kinds.join(" -> ").dimmed());
    }
}
