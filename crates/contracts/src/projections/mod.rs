pub mod p900_commission_earned;
