pub mod cloudformation;
pub mod ec2;
pub mod eks;
pub mod iam;
pub mod lambda;
pub mod s3;
pub mod ssm;
