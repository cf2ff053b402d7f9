//! Life command implementation.

use std::path::Path;

use anyhow::Result;
use exile_core::{Component, ContextConfig, Life, RemoteObject};
use owo_colors::OwoColorize;

use super::open_context;

/// Derived pool values of one life component
#[derive(Debug, Clone, PartialEq)]
pub struct LifeSummary {
    pub hp: (i32, i32),
    pub reserved_hp: i32,
    pub mana: (i32, i32),
    pub reserved_mana: i32,
    pub es: (i32, i32),
    pub hp_percentage: f32,
    pub mp_percentage: f32,
    pub es_percentage: f32,
}

impl LifeSummary {
    pub fn from_life(life: &Life) -> Self {
        Self {
            hp: (life.cur_hp(), life.max_hp()),
            reserved_hp: life.total_reserved_hp(),
            mana: (life.cur_mana(), life.max_mana()),
            reserved_mana: life.reserved_flat_mana(),
            es: (life.cur_es(), life.max_es()),
            hp_percentage: life.hp_percentage(),
            mp_percentage: life.mp_percentage(),
            es_percentage: life.es_percentage(),
        }
    }
}

fn print_pool(name: &str, (cur, max): (i32, i32), reserved: Option<i32>, percentage: f32) {
    let reserved = reserved
        .map(|r| format!(" (reserved {})", r))
        .unwrap_or_default();
    let bar = format!("{:>5.1}%", percentage * 100.0);
    let bar = if percentage < 0.35 {
        bar.red().to_string()
    } else {
        bar.green().to_string()
    };
    println!("  {:<6} {:>6} / {:<6}{} {}", name, cur, max, reserved, bar);
}

/// Run the life command
pub fn run(image: &Path, config: &ContextConfig, address: u64) -> Result<()> {
    let ctx = open_context(image, config)?;
    let life: Life = ctx.get_object(address);
    let summary = LifeSummary::from_life(&life);

    println!("{} {} (owner {})", "Life".bold(), life.address(), life.owner_address());
    print_pool("Life", summary.hp, Some(summary.reserved_hp), summary.hp_percentage);
    print_pool("Mana", summary.mana, Some(summary.reserved_mana), summary.mp_percentage);
    print_pool("ES", summary.es, None, summary.es_percentage);
    Ok(())
}
