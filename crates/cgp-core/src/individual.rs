//! Cartesian Genetic Programming genome.
//!
//! A genome is a flat vector of integer genes. Every node owns one function
//! gene followed by `max_arity` connection genes, and the genome ends with one
//! gene per output. Genes address a shared scratch space where addresses
//! `0..input_length` hold the inputs and `input_length + n` holds node `n`.

use std::cmp::Ordering;
use std::fmt::Write as _;

use rand::Rng;

use crate::error::{CgpError, Result};
use crate::functions::{self, Function};

// ── Layout ────────────────────────────────────────────────────────────────────

/// Shape shared by every individual of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Number of nodes in the encoded graph.
    pub graph_length: usize,
    /// Number of input variables.
    pub input_length: usize,
    /// Number of output variables.
    pub output_length: usize,
    /// Largest arity used by any function.
    pub max_arity: usize,
    /// Functions a node can compute; function genes index into this.
    pub functions: &'static [Function],
}

/// What a gene at a given index controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneKind {
    /// Selects the function of `node`.
    Function { node: usize },
    /// One of the input connections of `node`.
    Connection { node: usize },
    /// Selects the address an output reads from.
    Output,
}

impl Layout {
    /// Build a layout, rejecting shapes no genome can be drawn for.
    pub fn new(
        graph_length: usize,
        input_length: usize,
        output_length: usize,
        functions: &'static [Function],
    ) -> Result<Self> {
        if graph_length == 0 {
            return Err(CgpError::Config("graph_length must be at least 1".into()));
        }
        if input_length == 0 {
            return Err(CgpError::Config("input_length must be at least 1".into()));
        }
        if output_length == 0 {
            return Err(CgpError::Config("output_length must be at least 1".into()));
        }
        if functions.is_empty() {
            return Err(CgpError::Config("function set must not be empty".into()));
        }
        Ok(Self {
            graph_length,
            input_length,
            output_length,
            max_arity: functions::max_arity(functions),
            functions,
        })
    }

    /// Genes per node: one function gene plus `max_arity` connections.
    pub fn node_step(&self) -> usize {
        self.max_arity + 1
    }

    /// Total number of genes in a genome.
    pub fn genome_length(&self) -> usize {
        self.graph_length * self.node_step() + self.output_length
    }

    /// Number of scratch addresses (inputs plus nodes).
    pub fn address_count(&self) -> usize {
        self.input_length + self.graph_length
    }

    /// Classify the gene at `index`.
    pub fn gene_kind(&self, index: usize) -> GeneKind {
        let node = index / self.node_step();
        if node >= self.graph_length {
            GeneKind::Output
        } else if index % self.node_step() == 0 {
            GeneKind::Function { node }
        } else {
            GeneKind::Connection { node }
        }
    }

    /// Node index stored at scratch `address`, or `None` for an input.
    pub fn node_of(&self, address: usize) -> Option<usize> {
        address.checked_sub(self.input_length)
    }

    /// Draw a random valid value for the gene at `index`.
    ///
    /// When `avoid` is set the returned value differs from it unless the gene
    /// has no other valid value.
    pub fn random_gene<R: Rng + ?Sized>(
        &self,
        index: usize,
        avoid: Option<usize>,
        rng: &mut R,
    ) -> usize {
        let upper = match self.gene_kind(index) {
            GeneKind::Function { .. } => self.functions.len(),
            // Nodes may only read inputs and earlier nodes (feed-forward).
            GeneKind::Connection { node } => self.input_length + node,
            GeneKind::Output => self.address_count(),
        };
        pick(rng, upper, avoid)
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, upper: usize, avoid: Option<usize>) -> usize {
    if upper <= 1 {
        return 0;
    }
    loop {
        let choice = rng.gen_range(0..upper);
        if Some(choice) != avoid {
            return choice;
        }
    }
}

// ── Individual ────────────────────────────────────────────────────────────────

/// A genome together with its fitness and cached active node list.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    layout: Layout,
    genes: Vec<usize>,
    active: Vec<usize>,
    /// Fitness of the last evaluation. Copies inherit it from their source.
    pub fitness: f64,
}

impl Individual {
    /// Create an individual with every gene drawn at random.
    pub fn random<R: Rng + ?Sized>(layout: Layout, rng: &mut R) -> Self {
        let genes = (0..layout.genome_length())
            .map(|index| layout.random_gene(index, None, rng))
            .collect();
        Self::from_genes(layout, genes)
    }

    /// Create an individual from explicit genes.
    ///
    /// # Panics
    /// Panics if `genes` does not have exactly `layout.genome_length()` entries.
    pub fn from_genes(layout: Layout, genes: Vec<usize>) -> Self {
        assert_eq!(genes.len(), layout.genome_length(), "genome length mismatch");
        let mut individual = Self {
            layout,
            genes,
            active: Vec::new(),
            fitness: f64::NEG_INFINITY,
        };
        individual.determine_active_nodes();
        individual
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    /// Sorted indices of nodes that influence at least one output.
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    /// Connection genes of `node`.
    pub fn connections(&self, node: usize) -> &[usize] {
        let start = self.layout.node_step() * node;
        &self.genes[start + 1..start + self.layout.node_step()]
    }

    /// Function computed by `node`.
    pub fn function(&self, node: usize) -> Function {
        self.layout.functions[self.genes[self.layout.node_step() * node]]
    }

    /// Output genes (scratch addresses read by each output).
    pub fn outputs(&self) -> &[usize] {
        &self.genes[self.genes.len() - self.layout.output_length..]
    }

    /// Order two individuals by fitness alone.
    pub fn cmp_fitness(&self, other: &Individual) -> Ordering {
        self.fitness.total_cmp(&other.fitness)
    }

    /// Recompute the active node list from the current genes.
    pub fn determine_active_nodes(&mut self) {
        let mut is_active = vec![false; self.layout.graph_length];
        for &address in self.outputs() {
            if let Some(node) = self.layout.node_of(address) {
                is_active[node] = true;
            }
        }
        for node in (0..self.layout.graph_length).rev() {
            if !is_active[node] {
                continue;
            }
            for &address in self.connections(node) {
                if let Some(source) = self.layout.node_of(address) {
                    is_active[source] = true;
                }
            }
        }
        self.active = is_active
            .iter()
            .enumerate()
            .filter_map(|(node, &on)| on.then_some(node))
            .collect();
    }

    /// Execute the graph on `inputs` and return one value per output.
    pub fn evaluate(&self, inputs: &[bool]) -> Vec<bool> {
        let mut scratch = vec![false; self.layout.address_count()];
        let loaded = inputs.len().min(self.layout.input_length);
        scratch[..loaded].copy_from_slice(&inputs[..loaded]);

        let mut args = Vec::with_capacity(self.layout.max_arity);
        for &node in &self.active {
            args.clear();
            args.extend(self.connections(node).iter().map(|&a| scratch[a]));
            scratch[self.layout.input_length + node] = self.function(node).apply(&args);
        }

        self.outputs().iter().map(|&a| scratch[a]).collect()
    }

    /// Return a mutant where every gene independently changes with
    /// probability `rate`.
    pub fn mutate<R: Rng + ?Sized>(&self, rate: f64, rng: &mut R) -> Individual {
        let mut mutant = self.clone();
        for index in 0..mutant.genes.len() {
            if rng.gen::<f64>() < rate {
                let current = mutant.genes[index];
                mutant.genes[index] = mutant.layout.random_gene(index, Some(current), rng);
            }
        }
        mutant.determine_active_nodes();
        mutant
    }

    /// Return a mutant with exactly one changed active gene ("Single").
    ///
    /// Inactive genes changed while searching for an active one are kept.
    pub fn one_active_mutation<R: Rng + ?Sized>(&self, rng: &mut R) -> Individual {
        let mut mutant = self.clone();
        let length = mutant.genes.len();
        loop {
            let index = rng.gen_range(0..length);
            let value = mutant.layout.random_gene(index, None, rng);
            if value == mutant.genes[index] {
                continue;
            }
            mutant.genes[index] = value;
            let touched_active = match mutant.layout.gene_kind(index) {
                GeneKind::Output => true,
                GeneKind::Function { node } | GeneKind::Connection { node } => {
                    self.active.binary_search(&node).is_ok()
                }
            };
            if touched_active {
                break;
            }
        }
        mutant.determine_active_nodes();
        mutant
    }

    /// Number of gene changes needed to make `other` express the same
    /// phenotype as `self`. Only genes active in `self` are compared.
    pub fn asym_phenotypic_difference(&self, other: &Individual) -> usize {
        let step = self.layout.node_step();
        let mut count = crate::statistics::diff_count(self.outputs(), other.outputs());
        for &node in &self.active {
            let start = node * step;
            count += crate::statistics::diff_count(
                &self.genes[start..start + step],
                &other.genes[start..start + step],
            );
        }
        count
    }

    /// Human-readable listing of the active nodes and the output addresses.
    pub fn describe_active(&self) -> String {
        let mut out = String::new();
        for &node in &self.active {
            let _ = writeln!(
                out,
                "{} {} {:?}",
                node,
                self.function(node),
                self.connections(node)
            );
        }
        let _ = write!(out, "{:?}", self.outputs());
        out
    }
}
