pub mod ceo_education;
pub mod company;
pub mod company_competitor;
pub mod company_industry;
pub mod company_status_history;
pub mod competitor;
pub mod dashboard;
pub mod deal_type;
pub mod industry;
pub mod investor;
pub mod round;
pub mod round_investor;
pub mod sub_round;
pub mod user;

pub use company::CompanyStatus;

pub use ceo_education::Entity as CeoEducation;
pub use company::Entity as Company;
pub use company_competitor::Entity as CompanyCompetitor;
pub use company_industry::Entity as CompanyIndustry;
pub use company_status_history::Entity as CompanyStatusHistory;
pub use competitor::Entity as Competitor;
pub use dashboard::Entity as Dashboard;
pub use deal_type::Entity as DealType;
pub use industry::Entity as Industry;
pub use investor::Entity as Investor;
pub use round::Entity as Round;
pub use round_investor::Entity as RoundInvestor;
pub use sub_round::Entity as SubRound;
pub use user::Entity as User;
