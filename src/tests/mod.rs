mod fakes;
mod recommend;
