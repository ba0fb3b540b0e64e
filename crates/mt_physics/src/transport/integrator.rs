// crates/mt_physics/src/transport/integrator.rs

//! 显式变步长两步积分（Adams-Bashforth）
//!
//! - 冷启动（`previous_dt == 0`）：β0 = 1, β1 = 0（前向 Euler）
//! - 之后：ω = dt / previous_dt / 2，β0 = 1 + ω，β1 = -ω
//!
//! 逐节点：
//!
//! ```text
//! r    = residual / M
//! rate = β0 r + β1 dCdt_prev
//! dCdt = rate
//! C   += dt (rate + source_sink)
//! C    = clamp(C, 下限, 上限)
//! ```
//!
//! 给定浓度节点跳过，其值由边界阶段负责。
//! 失稳检查在写入之前完成，失败的一步不改动任何节点。

use crate::transport::state::TransportState;
use rayon::prelude::*;

/// 两步积分器
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ab2Integrator {
    previous_dt: f64,
}

impl Ab2Integrator {
    /// 创建（冷启动状态）
    pub fn new() -> Self {
        Self::default()
    }

    /// 上一步步长，0 表示尚未积分
    pub fn previous_dt(&self) -> f64 {
        self.previous_dt
    }

    /// 是否冷启动
    pub fn is_cold_start(&self) -> bool {
        self.previous_dt == 0.0
    }

    /// 回到冷启动状态
    pub fn reset(&mut self) {
        self.previous_dt = 0.0;
    }

    /// 本步系数 `(β0, β1)`
    pub fn coefficients(&self, dt: f64) -> (f64, f64) {
        if self.is_cold_start() {
            (1.0, 0.0)
        } else {
            let omega = dt / self.previous_dt / 2.0;
            (1.0 + omega, -omega)
        }
    }

    /// 推进一步
    ///
    /// 先只读检查全部节点，变化率存在非有限值时返回 `Err(dof)`（最小节点号），
    /// 此时浓度与变化率均保持步前值。无论成败都记录本步步长。
    pub fn integrate(
        &mut self,
        state: &mut TransportState,
        dt: f64,
        bounds: (f64, f64),
    ) -> Result<(), usize> {
        let (beta0, beta1) = self.coefficients(dt);
        let (lower, upper) = bounds;
        self.previous_dt = dt;

        let TransportState {
            dofs,
            bindings,
            residual,
            lumped_mass,
        } = state;
        let rate_of =
            |i: usize, dcdt_prev: f64| beta0 * residual[i].load() / lumped_mass[i] + beta1 * dcdt_prev;

        let unstable = dofs
            .par_iter()
            .enumerate()
            .filter(|(i, _)| !bindings[*i].is_prescribed())
            .filter(|(i, dof)| !(rate_of(*i, dof.dcdt) + dof.source_sink).is_finite())
            .map(|(i, _)| i)
            .min();
        if let Some(i) = unstable {
            return Err(i);
        }

        dofs.par_iter_mut()
            .enumerate()
            .filter(|(i, _)| !bindings[*i].is_prescribed())
            .for_each(|(i, dof)| {
                let rate = rate_of(i, dof.dcdt);
                dof.dcdt = rate;
                dof.c = (dof.c + dt * (rate + dof.source_sink)).clamp(lower, upper);
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcing::TimeFunction;

    #[test]
    fn test_cold_start_coefficients() {
        let mut integ = Ab2Integrator::new();
        assert_eq!(integ.coefficients(0.5), (1.0, 0.0));

        let mut state = TransportState::new(vec![2.0]);
        integ.integrate(&mut state, 0.5, (0.0, f64::INFINITY)).unwrap();
        assert_eq!(integ.previous_dt(), 0.5);

        // 等步长：1.5, -0.5
        assert_eq!(integ.coefficients(0.5), (1.5, -0.5));
        // 步长加倍：ω = 1
        assert_eq!(integ.coefficients(1.0), (2.0, -1.0));
    }

    #[test]
    fn test_forward_euler_first_step() {
        let mut state = TransportState::new(vec![2.0]);
        state.set_values(&[1.0]).unwrap();
        state.add_residual(0, 4.0);
        state.dofs[0].dcdt = 100.0;
        let mut integ = Ab2Integrator::new();
        integ.integrate(&mut state, 0.1, (0.0, f64::INFINITY)).unwrap();
        // rate = 4 / 2 = 2，忽略旧变化率
        assert!((state.dof(0).dcdt - 2.0).abs() < 1e-15);
        assert!((state.value(0) - 1.2).abs() < 1e-15);
    }

    #[test]
    fn test_second_step_uses_previous_rate() {
        let mut state = TransportState::new(vec![1.0]);
        state.set_values(&[1.0]).unwrap();
        let mut integ = Ab2Integrator::new();

        state.add_residual(0, 1.0);
        integ.integrate(&mut state, 0.1, (0.0, f64::INFINITY)).unwrap();
        state.reset_residuals();
        state.add_residual(0, 3.0);
        integ.integrate(&mut state, 0.1, (0.0, f64::INFINITY)).unwrap();
        // rate = 1.5 * 3 - 0.5 * 1 = 4
        assert!((state.dof(0).dcdt - 4.0).abs() < 1e-12);
        assert!((state.value(0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_and_source() {
        let mut state = TransportState::new(vec![1.0; 2]);
        state.set_values(&[1.0, 350.0]).unwrap();
        state.add_residual(0, -50.0);
        state.dofs[1].source_sink = 200.0;
        let mut integ = Ab2Integrator::new();
        integ.integrate(&mut state, 1.0, (0.0, 360.0)).unwrap();
        assert_eq!(state.value(0), 0.0);
        assert_eq!(state.value(1), 360.0);
    }

    #[test]
    fn test_prescribed_skipped() {
        let mut state = TransportState::new(vec![1.0]);
        state.set_values(&[5.0]).unwrap();
        state.bindings[0].boundary = Some(TimeFunction::Constant(5.0));
        state.add_residual(0, 10.0);
        Ab2Integrator::new().integrate(&mut state, 1.0, (0.0, 360.0)).unwrap();
        assert_eq!(state.value(0), 5.0);
    }

    #[test]
    fn test_reports_lowest_unstable_dof() {
        let mut state = TransportState::new(vec![1.0; 5]);
        state.add_residual(3, f64::NAN);
        state.add_residual(1, f64::INFINITY);
        let mut integ = Ab2Integrator::new();
        assert_eq!(integ.integrate(&mut state, 1.0, (0.0, 1.0)), Err(1));
        assert_eq!(integ.previous_dt(), 1.0);
    }

    #[test]
    fn test_failed_step_leaves_state_untouched() {
        let mut state = TransportState::new(vec![1.0; 3]);
        state.set_values(&[1.0, 2.0, 3.0]).unwrap();
        state.dofs[0].dcdt = 0.25;
        state.add_residual(0, 4.0);
        state.add_residual(2, f64::NAN);
        let mut integ = Ab2Integrator::new();
        assert_eq!(integ.integrate(&mut state, 0.5, (0.0, 10.0)), Err(2));
        // 稳定节点也不推进
        assert_eq!(state.values(), vec![1.0, 2.0, 3.0]);
        assert_eq!(state.dof(0).dcdt, 0.25);
    }
}
