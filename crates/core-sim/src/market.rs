use crate::instrument::{Instrument, InstrumentSpec, Symbol};

/// The set of simulated instruments, kept in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    instruments: Vec<Instrument>,
}

impl Market {
    /// Builds a market, dropping later specs that repeat a symbol.
    pub fn new(specs: &[InstrumentSpec], now_ms: i64) -> Self {
        let mut instruments: Vec<Instrument> = Vec::with_capacity(specs.len());
        for spec in specs {
            if instruments.iter().any(|i| i.symbol() == &spec.symbol) {
                tracing::warn!(symbol = %spec.symbol, "duplicate instrument symbol ignored");
                continue;
            }
            instruments.push(Instrument::new(spec.clone(), now_ms));
        }

        Self { instruments }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol() == symbol)
    }

    pub fn get_mut(&mut self, symbol: &Symbol) -> Option<&mut Instrument> {
        self.instruments.iter_mut().find(|i| i.symbol() == symbol)
    }

    pub fn price(&self, symbol: &Symbol) -> Option<f64> {
        self.get(symbol).map(Instrument::price)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Instrument> {
        self.instruments.iter_mut()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.instruments.iter().map(Instrument::symbol)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
