pub mod a001_community;
pub mod a002_lottery_event;
pub mod a003_lottery_book;
pub mod a004_book_distribution;
pub mod a005_payment_collection;
pub mod a006_commission_setting;
pub mod a007_lottery_winner;
pub mod a008_csf_member;
pub mod a009_csf_payment;
pub mod a010_deletion_request;
