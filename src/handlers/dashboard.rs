use crate::handlers::nepali_date::NepaliPeriod;
use crate::models::all_models::{Bill, Customer, Payment};
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPoint {
    pub period_label: String,
    pub period_year: i32,
    pub value: f64,
}

/// A record that can be placed on the Nepali month axis.
pub trait Dated {
    fn nepali_month(&self) -> Option<&str>;
    fn nepali_year(&self) -> Option<i32>;
    fn gregorian_date(&self) -> Option<NaiveDate>;

    fn period(&self) -> Option<NepaliPeriod> {
        NepaliPeriod::resolve(self.nepali_month(), self.nepali_year(), self.gregorian_date())
    }
}

impl Dated for Bill {
    fn nepali_month(&self) -> Option<&str> {
        self.nepali_month.as_deref()
    }
    fn nepali_year(&self) -> Option<i32> {
        self.nepali_year
    }
    fn gregorian_date(&self) -> Option<NaiveDate> {
        Some(self.bill_date)
    }
}

impl Dated for Payment {
    fn nepali_month(&self) -> Option<&str> {
        self.nepali_month.as_deref()
    }
    fn nepali_year(&self) -> Option<i32> {
        self.nepali_year
    }
    fn gregorian_date(&self) -> Option<NaiveDate> {
        Some(self.payment_date)
    }
}

impl Dated for Customer {
    fn nepali_month(&self) -> Option<&str> {
        self.nepali_month.as_deref()
    }
    fn nepali_year(&self) -> Option<i32> {
        self.nepali_year
    }
    fn gregorian_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|at| at.date())
    }
}

/// Buckets records by Nepali month and sums `value_of` per bucket, in
/// chronological order. Records with no resolvable period are skipped.
pub fn aggregate_by_period<R, P, V>(records: &[R], period_of: P, value_of: V) -> Vec<PeriodPoint>
where
    P: Fn(&R) -> Option<NepaliPeriod>,
    V: Fn(&R) -> f64,
{
    let mut buckets: BTreeMap<NepaliPeriod, f64> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in records {
        match period_of(record) {
            Some(period) => *buckets.entry(period).or_insert(0.0) += value_of(record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("{} record(s) had no usable date and were left out", skipped);
    }

    buckets
        .into_iter()
        .map(|(period, value)| PeriodPoint {
            period_label: period.label().to_string(),
            period_year: period.year,
            value,
        })
        .collect()
}

pub fn sum_by_period<R: Dated>(records: &[R], value_of: impl Fn(&R) -> f64) -> Vec<PeriodPoint> {
    aggregate_by_period(records, R::period, value_of)
}

pub fn count_by_period<R: Dated>(records: &[R]) -> Vec<PeriodPoint> {
    aggregate_by_period(records, R::period, |_| 1.0)
}

/// `(current - previous) / previous * 100`, pinned to a finite value when
/// the previous period is zero.
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 {
            100.0
        } else if current < 0.0 {
            -100.0
        } else {
            0.0
        };
    }
    (current - previous) / previous * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub change: f64,
    pub favorable: bool,
}

pub fn trend(previous: f64, current: f64, polarity: Polarity) -> Trend {
    let change = percent_change(previous, current);
    let favorable = match polarity {
        Polarity::HigherIsBetter => change >= 0.0,
        Polarity::LowerIsBetter => change <= 0.0,
    };
    Trend { change, favorable }
}

/// Trend between the last two buckets of a series.
pub fn latest_trend(series: &[PeriodPoint], polarity: Polarity) -> Trend {
    match series {
        [.., previous, current] => trend(previous.value, current.value, polarity),
        [only] => trend(0.0, only.value, polarity),
        [] => trend(0.0, 0.0, polarity),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_customers: usize,
    pub total_bills: usize,
    pub outstanding_bills: usize,
    pub total_revenue: f64,
    pub revenue_by_period: Vec<PeriodPoint>,
    pub bills_by_period: Vec<PeriodPoint>,
    pub new_customers_by_period: Vec<PeriodPoint>,
    pub pending_bills_by_period: Vec<PeriodPoint>,
    pub revenue_trend: Trend,
    pub new_customers_trend: Trend,
    pub pending_bills_trend: Trend,
}

pub fn admin_summary(bills: &[Bill], payments: &[Payment], customers: &[Customer]) -> AdminDashboard {
    let revenue_by_period = sum_by_period(payments, |p| p.amount);
    let new_customers_by_period = count_by_period(customers);
    let pending_bills_by_period = aggregate_by_period(bills, Bill::period, |b| {
        if b.status.is_outstanding() {
            1.0
        } else {
            0.0
        }
    });

    AdminDashboard {
        total_customers: customers.len(),
        total_bills: bills.len(),
        outstanding_bills: bills.iter().filter(|b| b.status.is_outstanding()).count(),
        total_revenue: payments.iter().map(|p| p.amount).sum(),
        revenue_trend: latest_trend(&revenue_by_period, Polarity::HigherIsBetter),
        new_customers_trend: latest_trend(&new_customers_by_period, Polarity::HigherIsBetter),
        pending_bills_trend: latest_trend(&pending_bills_by_period, Polarity::LowerIsBetter),
        bills_by_period: count_by_period(bills),
        revenue_by_period,
        new_customers_by_period,
        pending_bills_by_period,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClerkDashboard {
    pub outstanding_bills: usize,
    pub bills_by_period: Vec<PeriodPoint>,
    pub collections_by_period: Vec<PeriodPoint>,
    pub collection_trend: Trend,
}

pub fn clerk_summary(bills: &[Bill], payments: &[Payment]) -> ClerkDashboard {
    let collections_by_period = sum_by_period(payments, |p| p.amount);
    ClerkDashboard {
        outstanding_bills: bills.iter().filter(|b| b.status.is_outstanding()).count(),
        bills_by_period: count_by_period(bills),
        collection_trend: latest_trend(&collections_by_period, Polarity::HigherIsBetter),
        collections_by_period,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDashboard {
    pub outstanding_balance: f64,
    pub total_paid: f64,
    pub billed_by_period: Vec<PeriodPoint>,
    pub paid_by_period: Vec<PeriodPoint>,
}

pub fn customer_summary(bills: &[Bill], payments: &[Payment]) -> CustomerDashboard {
    CustomerDashboard {
        outstanding_balance: bills
            .iter()
            .filter(|b| b.status.is_outstanding())
            .map(|b| b.amount)
            .sum(),
        total_paid: payments.iter().map(|p| p.amount).sum(),
        billed_by_period: sum_by_period(bills, |b| b.amount),
        paid_by_period: sum_by_period(payments, |p| p.amount),
    }
}
