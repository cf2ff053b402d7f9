//! Entity components
//!
//! Components project derived numbers from one raw snapshot. Every property
//! checks the address first and falls back to a neutral value when unbound,
//! so ratios never divide by zero on an unbound component.

use std::sync::Arc;

use crate::cache::CachedValue;
use crate::context::RemoteContext;
use crate::memory::layout::LifeComponentOffsets;
use crate::object::{Address, RemoteObject};

/// A remote object attached to an owning entity
pub trait Component: RemoteObject {
    fn owner_address(&self) -> Address;
}

/// Health, mana and energy shield of an entity
#[derive(Clone)]
pub struct Life {
    ctx: RemoteContext,
    address: Address,
    raw: Arc<CachedValue<LifeComponentOffsets>>,
}

impl RemoteObject for Life {
    fn from_address(ctx: &RemoteContext, address: Address) -> Self {
        let reader = ctx.clone();
        let raw = CachedValue::frame(ctx.frames().clone(), move || reader.read(address));
        Self {
            ctx: ctx.clone(),
            address,
            raw: Arc::new(raw),
        }
    }

    fn address(&self) -> Address {
        self.address
    }

    fn context(&self) -> &RemoteContext {
        &self.ctx
    }
}

impl Component for Life {
    fn owner_address(&self) -> Address {
        Address::new(self.raw().owner)
    }
}

impl PartialEq for Life {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl std::fmt::Debug for Life {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Life")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn ratio(numerator: i32, denominator: i32) -> f32 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f32 / denominator as f32
}

impl Life {
    /// Raw snapshot for the current frame
    pub fn raw(&self) -> LifeComponentOffsets {
        self.raw.value()
    }

    fn bound(&self) -> bool {
        !self.address.is_null()
    }

    pub fn max_hp(&self) -> i32 {
        if self.bound() { self.raw().max_hp } else { 1 }
    }

    pub fn cur_hp(&self) -> i32 {
        if self.bound() { self.raw().cur_hp } else { 0 }
    }

    /// Percent of maximum life reserved; the raw field is in hundredths of a percent
    pub fn reserved_percent_hp(&self) -> f64 {
        self.raw().reserved_percent_hp as f64 / 100.0
    }

    pub fn reserved_flat_hp(&self) -> i32 {
        if self.bound() {
            self.raw().reserved_flat_hp
        } else {
            0
        }
    }

    /// Flat plus percentage reservation, truncated
    ///
    /// The raw percent is in 1/10000 of maximum life.
    pub fn total_reserved_hp(&self) -> i32 {
        if !self.bound() {
            return 0;
        }
        let raw = self.raw();
        let percent = raw.reserved_percent_hp as f64 / 10000.0;
        (raw.reserved_flat_hp as f64 + raw.max_hp as f64 * percent) as i32
    }

    pub fn max_mana(&self) -> i32 {
        if self.bound() { self.raw().max_mana } else { 1 }
    }

    /// Unbound components report 1 here, not 0
    pub fn cur_mana(&self) -> i32 {
        if self.bound() { self.raw().cur_mana } else { 1 }
    }

    pub fn reserved_percent_mana(&self) -> f64 {
        if self.bound() {
            self.raw().reserved_percent_mana as f64 / 100.0
        } else {
            0.0
        }
    }

    /// Mana reserved by the percentage reservation, rounded half to even
    ///
    /// Divides the already-scaled percent by 100 once more, unlike
    /// [`Life::total_reserved_hp`]. Kept as is.
    pub fn reserved_flat_mana(&self) -> i32 {
        (self.max_mana() as f64 * self.reserved_percent_mana() / 100.0).round_ties_even() as i32
    }

    pub fn max_es(&self) -> i32 {
        self.raw().max_es
    }

    pub fn cur_es(&self) -> i32 {
        self.raw().cur_es
    }

    /// Current life over unreserved maximum
    pub fn hp_percentage(&self) -> f32 {
        ratio(self.cur_hp(), self.max_hp() - self.reserved_flat_hp())
    }

    pub fn mp_percentage(&self) -> f32 {
        ratio(self.cur_mana(), self.max_mana() - self.reserved_flat_mana())
    }

    /// 0 when there is no energy shield
    pub fn es_percentage(&self) -> f32 {
        ratio(self.cur_es(), self.max_es())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FrameCounter;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};

    const LIFE: u64 = 0x7000;

    fn life_with(raw: LifeComponentOffsets) -> (Arc<MockMemoryReader>, Life) {
        let reader = Arc::new(MockMemoryBuilder::new().write_pod(LIFE, &raw).build());
        let ctx = RemoteContext::builder(reader.clone())
            .frames(FrameCounter::new())
            .build();
        let life = ctx.get_object(LIFE);
        (reader, life)
    }

    #[test]
    fn test_unbound_defaults_without_reads() {
        let reader = Arc::new(MockMemoryBuilder::new().build());
        let ctx = RemoteContext::new(reader.clone());
        let life: Life = ctx.get_object(0u64);

        assert_eq!(life.max_hp(), 1);
        assert_eq!(life.cur_hp(), 0);
        assert_eq!(life.reserved_flat_hp(), 0);
        assert_eq!(life.reserved_percent_hp(), 0.0);
        assert_eq!(life.total_reserved_hp(), 0);
        assert_eq!(life.max_mana(), 1);
        assert_eq!(life.cur_mana(), 1);
        assert_eq!(life.reserved_percent_mana(), 0.0);
        assert_eq!(life.reserved_flat_mana(), 0);
        assert_eq!(life.max_es(), 0);
        assert_eq!(life.cur_es(), 0);
        assert_eq!(life.hp_percentage(), 0.0);
        assert_eq!(life.mp_percentage(), 1.0);
        assert_eq!(life.es_percentage(), 0.0);
        assert!(life.owner_address().is_null());
        assert_eq!(reader.read_count(), 0);
    }

    #[test]
    fn test_hp_reservation() {
        let (_, life) = life_with(LifeComponentOffsets {
            max_hp: 1000,
            cur_hp: 400,
            reserved_flat_hp: 100,
            reserved_percent_hp: 500,
            ..Default::default()
        });

        assert_eq!(life.total_reserved_hp(), 150);
        assert_eq!(life.reserved_percent_hp(), 5.0);
        assert!((life.hp_percentage() - 400.0 / 900.0).abs() < 1e-6);
    }

    #[test]
    fn test_total_reserved_hp_truncates() {
        let (_, life) = life_with(LifeComponentOffsets {
            max_hp: 999,
            reserved_flat_hp: 0,
            reserved_percent_hp: 3333,
            ..Default::default()
        });

        // 999 * 0.3333 = 332.97
        assert_eq!(life.total_reserved_hp(), 332);
    }

    #[test]
    fn test_mana_reservation() {
        let (_, life) = life_with(LifeComponentOffsets {
            max_mana: 500,
            cur_mana: 200,
            reserved_percent_mana: 5000,
            ..Default::default()
        });

        assert_eq!(life.reserved_percent_mana(), 50.0);
        assert_eq!(life.reserved_flat_mana(), 250);
        assert!((life.mp_percentage() - 200.0 / 250.0).abs() < 1e-6);
    }

    #[test]
    fn test_mana_reservation_rounds_half_to_even() {
        let (_, life) = life_with(LifeComponentOffsets {
            max_mana: 25,
            reserved_percent_mana: 1000,
            ..Default::default()
        });

        // 25 * 10 / 100 = 2.5
        assert_eq!(life.reserved_flat_mana(), 2);
    }

    #[test]
    fn test_es_percentage_zero_max() {
        let (_, life) = life_with(LifeComponentOffsets {
            max_es: 0,
            cur_es: 300,
            ..Default::default()
        });

        assert_eq!(life.es_percentage(), 0.0);
    }

    #[test]
    fn test_es_percentage() {
        let (_, life) = life_with(LifeComponentOffsets {
            max_es: 400,
            cur_es: 100,
            ..Default::default()
        });

        assert_eq!(life.es_percentage(), 0.25);
    }

    #[test]
    fn test_fully_reserved_life_does_not_divide_by_zero() {
        let (_, life) = life_with(LifeComponentOffsets {
            max_hp: 100,
            cur_hp: 1,
            reserved_flat_hp: 100,
            ..Default::default()
        });

        assert_eq!(life.hp_percentage(), 0.0);
    }

    #[test]
    fn test_one_read_per_frame() {
        let (reader, life) = life_with(LifeComponentOffsets {
            owner: 0x9000,
            max_hp: 10,
            cur_hp: 5,
            ..Default::default()
        });

        life.max_hp();
        life.cur_hp();
        life.hp_percentage();
        assert_eq!(life.owner_address(), Address::new(0x9000));
        assert_eq!(reader.read_count(), 1);

        life.context().tick();
        life.cur_hp();
        assert_eq!(reader.read_count(), 2);
    }
}
