use crate::endpoints::{
    PeriodId,
    auth::{Login, RefreshToken, Register},
    periods::{CreatePeriod, DeletePeriod, GetPeriod, ListPeriods, UpdatePeriod},
    reports::{
        GetCycleContext, GetCycleStats, GetOvulationWindow, GetPeriodStats,
        GetPredictedNextPeriod,
    },
    users::{ChangePassword, DeleteMe, GetMe},
};
use chrono::NaiveDate;

pub struct AuthRepository;

impl AuthRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn login(&self, login: impl Into<String>, password: impl Into<String>) -> Login {
        Login::new(login, password)
    }

    pub fn register(
        &self,
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Register {
        Register::new(username, email, password, confirm_password)
    }

    pub fn refresh(&self) -> RefreshToken {
        RefreshToken::new()
    }
}

impl Default for AuthRepository {
    fn default() -> Self {
        Self::new()
    }
}

pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn me(&self) -> GetMe {
        GetMe
    }

    pub fn change_password(
        &self,
        current_password: impl Into<String>,
        new_password: impl Into<String>,
    ) -> ChangePassword {
        ChangePassword::new(current_password, new_password)
    }

    pub fn delete_me(&self) -> DeleteMe {
        DeleteMe
    }
}

impl Default for UserRepository {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PeriodRepository;

impl PeriodRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn list(&self, page: u32, per_page: u32) -> ListPeriods {
        ListPeriods::new().page(page).per_page(per_page)
    }

    pub fn get(&self, period_id: PeriodId) -> GetPeriod {
        GetPeriod::new(period_id)
    }

    pub fn create(&self, start_date: NaiveDate) -> CreatePeriod {
        CreatePeriod::new(start_date)
    }

    pub fn update(&self, period_id: PeriodId, end_date: NaiveDate) -> UpdatePeriod {
        UpdatePeriod::new(period_id, end_date)
    }

    pub fn delete(&self, period_id: PeriodId) -> DeletePeriod {
        DeletePeriod::new(period_id)
    }
}

impl Default for PeriodRepository {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ReportRepository;

impl ReportRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn period_stats(&self) -> GetPeriodStats {
        GetPeriodStats
    }

    pub fn cycle_stats(&self) -> GetCycleStats {
        GetCycleStats
    }

    pub fn predicted_next_period(&self) -> GetPredictedNextPeriod {
        GetPredictedNextPeriod
    }

    pub fn ovulation_window(&self) -> GetOvulationWindow {
        GetOvulationWindow
    }

    pub fn cycle_context(&self) -> GetCycleContext {
        GetCycleContext
    }
}

impl Default for ReportRepository {
    fn default() -> Self {
        Self::new()
    }
}
