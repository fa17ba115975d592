mod forces;

use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::quadtree::QuadNode;
use crate::topology::RenderNode;
use forces::{
    ChargeParams, CollisionParams, Link, accumulate_charge_for_node, accumulate_collision_pairs,
    apply_centering, apply_links, apply_positioning,
};

pub const PERFORMANCE_NODE_THRESHOLD: usize = 200;
pub const PERFORMANCE_EDGE_THRESHOLD: usize = 500;

pub const ALPHA_MIN: f32 = 0.001;
/// `alpha_target` held while the user drags a node.
pub const DRAG_ALPHA_TARGET: f32 = 0.3;
pub const DEFAULT_COLLISION_RADIUS: f32 = 50.0;
pub const GROUP_COLLISION_SCALE: f32 = 1.5;

const CHARGE_DISTANCE_MAX: f32 = 600.0;
const POSITION_STRENGTH: f32 = 0.05;
const COLLISION_STRENGTH: f32 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    #[default]
    Auto,
    Quality,
    Performance,
}

impl PerformanceMode {
    pub fn is_active(self, node_count: usize, edge_count: usize) -> bool {
        match self {
            Self::Auto => {
                node_count > PERFORMANCE_NODE_THRESHOLD || edge_count > PERFORMANCE_EDGE_THRESHOLD
            }
            Self::Quality => false,
            Self::Performance => true,
        }
    }
}

pub fn tuned_link_distance(node_count: usize) -> f32 {
    (1500.0 / (node_count.max(1) as f32).sqrt()).clamp(100.0, 200.0)
}

pub fn tuned_charge_strength(node_count: usize) -> f32 {
    (-300.0 - 0.5 * node_count as f32).clamp(-800.0, -200.0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParams {
    pub link_distance: f32,
    pub charge_strength: f32,
    pub collision_radius: f32,
    pub center: Pos2,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub theta: f32,
    pub performance: bool,
}

impl SimulationParams {
    pub fn tuned(node_count: usize, edge_count: usize, center: Pos2, mode: PerformanceMode) -> Self {
        let performance = mode.is_active(node_count, edge_count);
        let (alpha_decay, velocity_decay, theta) = if performance {
            (0.05, 0.6, 1.5)
        } else {
            (1.0 - ALPHA_MIN.powf(1.0 / 300.0), 0.4, 0.9)
        };

        Self {
            link_distance: tuned_link_distance(node_count),
            charge_strength: tuned_charge_strength(node_count),
            collision_radius: DEFAULT_COLLISION_RADIUS,
            center,
            alpha_decay,
            velocity_decay,
            theta,
            performance,
        }
    }
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Pos2>,
    predicted: Vec<Pos2>,
    velocities: Vec<Vec2>,
    deltas: Vec<Vec2>,
    radii: Vec<f32>,
}

pub struct Simulation {
    params: SimulationParams,
    links: Vec<Link>,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    scratch: PhysicsScratch,
}

impl Simulation {
    pub fn new(params: SimulationParams, links: &[(usize, usize)], node_count: usize) -> Self {
        let pairs = links
            .iter()
            .copied()
            .filter(|&(source, target)| {
                source != target && source < node_count && target < node_count
            })
            .collect::<Vec<_>>();

        Self {
            params,
            links: Link::build(&pairs, node_count),
            alpha: 1.0,
            alpha_target: 0.0,
            running: true,
            scratch: PhysicsScratch::default(),
        }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_alpha_target(&mut self, alpha_target: f32) {
        self.alpha_target = alpha_target.clamp(0.0, 1.0);
    }

    pub fn restart(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn step(&mut self, nodes: &mut [RenderNode]) -> bool {
        if !self.running {
            return false;
        }

        if nodes.len() < 2 {
            for node in nodes.iter_mut() {
                if let Some(pin) = node.pin {
                    node.pos = pin;
                }
                node.velocity = Vec2::ZERO;
            }
            self.alpha = 0.0;
            self.running = false;
            return false;
        }

        self.tick(nodes);

        if self.alpha < ALPHA_MIN {
            tracing::debug!(alpha = self.alpha, "force simulation settled");
            self.running = false;
        }
        self.running
    }

    fn tick(&mut self, nodes: &mut [RenderNode]) {
        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
        let alpha = self.alpha;
        let params = self.params;

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        let mut max_radius = 0.0_f32;
        for node in nodes.iter() {
            scratch.positions.push(node.pos);
            scratch.velocities.push(node.velocity);
            let radius = if node.is_group_node() {
                params.collision_radius * GROUP_COLLISION_SCALE
            } else {
                params.collision_radius
            };
            max_radius = max_radius.max(radius);
            scratch.radii.push(radius);
        }

        apply_links(
            &self.links,
            &scratch.positions,
            &mut scratch.velocities,
            params.link_distance,
            alpha,
        );

        if let Some(tree) = QuadNode::build(&scratch.positions) {
            let charge = ChargeParams {
                strength: params.charge_strength,
                theta_sq: params.theta * params.theta,
                distance_max_sq: CHARGE_DISTANCE_MAX * CHARGE_DISTANCE_MAX,
                alpha,
            };
            for (index, velocity) in scratch.velocities.iter_mut().enumerate() {
                accumulate_charge_for_node(&tree, index, &scratch.positions, charge, velocity);
            }
        }

        scratch.predicted.clear();
        scratch.predicted.extend(
            scratch
                .positions
                .iter()
                .zip(&scratch.velocities)
                .map(|(position, velocity)| *position + *velocity),
        );
        scratch.deltas.clear();
        scratch.deltas.resize(nodes.len(), Vec2::ZERO);
        if max_radius > 0.0
            && let Some(tree) = QuadNode::build(&scratch.predicted)
        {
            let reach = max_radius * 2.0;
            accumulate_collision_pairs(
                &tree,
                &tree,
                true,
                &scratch.predicted,
                &scratch.radii,
                CollisionParams {
                    strength: COLLISION_STRENGTH,
                    max_collision_distance_sq: reach * reach,
                },
                &mut scratch.deltas,
            );
        }
        for (velocity, delta) in scratch.velocities.iter_mut().zip(&scratch.deltas) {
            *velocity += *delta;
        }

        apply_centering(&mut scratch.positions, params.center);
        apply_positioning(
            &scratch.positions,
            &mut scratch.velocities,
            params.center,
            POSITION_STRENGTH,
            alpha,
        );

        let retain = 1.0 - params.velocity_decay;
        for ((node, position), velocity) in nodes
            .iter_mut()
            .zip(&scratch.positions)
            .zip(&scratch.velocities)
        {
            if let Some(pin) = node.pin {
                node.pos = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }
            node.velocity = *velocity * retain;
            node.pos = *position + node.velocity;
        }
    }
}
